//! Core library for ocrman
//!
//! This crate holds the parts of the OCR batch manager that need neither
//! subprocesses nor PDF parsing: the batch configuration model, input
//! enumeration and output naming, and the transcript comparison used to
//! measure OCR accuracy.
//!
//! The `ocrman` binary owns everything that talks to the outside world
//! (Tesseract, ImageMagick, Java) and orchestrates these pieces.
//!
//! # Module Organization
//!
//! - [`config`]: Config file formats, schema defaults and validation
//! - [`inputs`]: Input collection, file classification and output paths
//! - [`compare`]: Wordlists and similarity scores for transcript comparison

pub mod compare;
pub mod config;
pub mod inputs;
