mod helpers;
mod log;
mod search;
mod summary;

pub(crate) use log::{cmd_add, cmd_clear, cmd_export, cmd_import, cmd_log, cmd_remove};
pub(crate) use search::{cmd_search, cmd_show, cmd_stats, cmd_top};
pub(crate) use summary::{cmd_analyze, cmd_recommend, cmd_summary};
