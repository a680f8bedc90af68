//! Rain cloud panel service.
//!
//! Captures the current and one-hour-ahead radar maps in parallel,
//! reclassifies their rainfall colors and composites them with distance rings,
//! captions and a shared legend. Whole-panel attempts are retried; when every
//! attempt fails an error placeholder of the same size is produced instead.

pub mod composer;
pub mod notify;
pub mod supervisor;

pub use composer::FrameComposer;
pub use notify::{format_traceback, ErrorReport, LogNotifier, Notifier, SlackNotifier};
pub use supervisor::{Compose, PipelineResult, RetrySupervisor};
