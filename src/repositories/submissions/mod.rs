mod commands;
mod queries;
mod types;

pub(crate) use commands::{
    complete, create_listening, create_writing, fail_stale, mark_failed,
};
pub(crate) use queries::{
    count_by_user, find_by_id, find_listening_details, find_owned, find_result,
    find_writing_details, list_by_user,
};
pub(crate) use types::{
    CompletionUpdate, NewListeningSubmission, NewWritingSubmission, SubmissionFilter,
    SubmissionListRow,
};
