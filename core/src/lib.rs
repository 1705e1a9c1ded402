//! `adya-core` builds a Direct Serialization Graph from a recorded history
//! of database transactions and checks it against Adya's isolation
//! hierarchy, reporting any anomaly it finds as a witness a human can read.
//!
//! The entry points are [`history::HistoryIndex`] (wrap a recorded
//! [`log::OperationLog`]) and [`checker::check_history`] (verify it against
//! an [`policy::IsolationLevel`]).
//!
//! ```rust
//! use adya_core::checker::check_history;
//! use adya_core::history::HistoryIndex;
//! use adya_core::policy::IsolationLevel;
//!
//! fn run(log: adya_core::log::OperationLog) -> adya_core::error::CResult<()> {
//!     let hist = HistoryIndex::new(log)?;
//!     let anomalies = check_history(&hist, IsolationLevel::Pl3, Some(10))?;
//!     for anomaly in &anomalies {
//!         println!("{anomaly}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod checker;
pub mod codec;
pub mod dependency;
pub mod dot;
pub mod dsg;
pub mod error;
pub mod history;
pub mod log;
pub mod noncyclical;
pub mod op;
pub mod policy;
pub mod taxonomy;
pub mod value;
pub mod witness;
