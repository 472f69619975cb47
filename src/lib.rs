#![doc = include_str!("../README.md")]
pub mod app;
#[cfg(feature = "whisper")]
pub mod asr;
#[cfg(feature = "whisper")]
pub mod audio;
pub mod config;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod listen;
pub mod logging;
pub mod matcher;
pub mod schedule;
pub mod synth;
pub mod vocabulary;
