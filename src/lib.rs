//! vocabfetch - enrich vocabulary spreadsheets for flashcard decks.
//!
//! Reads a word table, fills missing glosses from a lookup site, finds
//! pronunciation audio and definition pages on a dictionary site, downloads
//! the audio and writes the table back with `[sound:...]` markers.

pub mod cli;
pub mod config;
pub mod models;
pub mod scrapers;
pub mod services;
pub mod table;
