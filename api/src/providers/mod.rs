pub mod completion;
pub mod identification;

/// Longest provider error body carried into error messages and logs.
const ERROR_DETAIL_CHARS: usize = 200;

fn error_detail(body: String) -> String {
    body.chars().take(ERROR_DETAIL_CHARS).collect()
}
