//! Speech emotion decision rule and the diagnostics around it.
//!
//! The core is [`emotion`]: three raw scores (ang, hap, sad) in, one of
//! `ang`/`hap`/`sad`/`other` out, by either the dominance rule or arg-max.
//! The rest feeds it: WAV decoding and synthetic tones ([`audio`]), inference
//! and model inspection ([`model`]), file-level analysis ([`analyzer`]) and
//! persisted settings ([`config`]).

pub mod analyzer;
pub mod audio;
pub mod config;
pub mod emotion;
pub mod model;
