pub(crate) mod grading;
pub(crate) mod performance;
pub(crate) mod progress;
pub(crate) mod storage;
