//! Admin-boundary validation of explicit code values.

use crate::CodeError;

/// Which explicit code values an admin may issue.
///
/// Random fallback codes are always five digits and are not checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeFormat {
    /// Any non-empty string (after trimming).
    Any,
    /// Exactly this many ASCII digits.
    Digits(usize),
}

impl CodeFormat {
    pub fn check(&self, code: &str) -> Result<(), CodeError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(CodeError::InvalidFormat("code is empty".to_string()));
        }
        match *self {
            CodeFormat::Any => Ok(()),
            CodeFormat::Digits(len) => {
                if code.len() == len && code.bytes().all(|b| b.is_ascii_digit()) {
                    Ok(())
                } else {
                    Err(CodeError::InvalidFormat(format!(
                        "code must be exactly {len} digits"
                    )))
                }
            }
        }
    }
}
