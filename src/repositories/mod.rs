pub(crate) mod health;
pub(crate) mod submissions;
pub(crate) mod users;
