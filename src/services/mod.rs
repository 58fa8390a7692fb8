pub(crate) mod assessment;
pub(crate) mod catalog;
pub(crate) mod dispatch;
pub(crate) mod intake;
pub(crate) mod maintenance;
pub(crate) mod storage;
