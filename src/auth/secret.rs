//! Redacted secret wrappers keeping token material out of logs.

// self
use crate::_prelude::*;

macro_rules! def_secret {
	($name:ident, $doc:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
		pub struct $name(String);
		impl $name {
			/// Wraps a new secret string.
			pub fn new(value: impl Into<String>) -> Self {
				Self(value.into())
			}

			/// Returns the inner value. Callers must avoid logging this string.
			pub fn expose(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				self.expose()
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.debug_tuple(stringify!($name)).field(&"<redacted>").finish()
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str("<redacted>")
			}
		}
	};
}

def_secret! { AuthToken, "Short-lived token authenticating wait-time calls; replaced on every successful re-authentication." }
def_secret! { RefreshCredential, "Long-lived credential used solely to obtain new auth tokens; never rotated by the pacer." }

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let token = AuthToken::new("tkn1");

		assert_eq!(format!("{token:?}"), "AuthToken(\"<redacted>\")");
		assert_eq!(format!("{token}"), "<redacted>");

		let refresh = RefreshCredential::new("refresh-secret");

		assert_eq!(format!("{refresh:?}"), "RefreshCredential(\"<redacted>\")");
		assert_eq!(refresh.expose(), "refresh-secret");
	}
}
