//! Answer formatting: raw answer text → ordered text / code segments.
//!
//! ```rust
//! use capture_answer::format::{parse, FormattedSegment};
//!
//! for segment in parse("Run this:\n```sh\ncargo test\n```") {
//!     match segment {
//!         FormattedSegment::Text { content } => print!("{content}"),
//!         FormattedSegment::Code { language, content, .. } => {
//!             println!("[{language}]\n{content}")
//!         }
//!     }
//! }
//! ```

pub mod language;
pub mod parser;

pub use language::{normalize_language, DEFAULT_LANGUAGE};
pub use parser::{parse, reassemble, FormattedSegment};
