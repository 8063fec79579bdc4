mod check;

pub use check::{CheckDetail, CheckKind, CheckRequest, CheckResponse};
