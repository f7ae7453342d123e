//! Capture & Answer: screenshot, paste or speak a question, get an answer
//! from a multimodal model.
//!
//! | Module | Role |
//! |--------|------|
//! | [`capture`] | screen and clipboard images |
//! | [`audio`] | microphone recording to a WAV payload |
//! | [`stt`] | speech-to-text over the transcription API |
//! | [`llm`] | answer providers, routing and image hosting |
//! | [`format`] | answer text to prose and code segments |
//! | [`pipeline`] | the run coordinator and the UI view |
//! | [`shortcut`] | global shortcuts relayed into the pipeline |
//! | [`config`] | `settings.toml` and platform paths |
//! | [`app`] | the egui window |

pub mod app;
pub mod audio;
pub mod capture;
pub mod config;
pub mod format;
pub mod http;
pub mod llm;
pub mod pipeline;
pub mod shortcut;
pub mod stt;
