use crate::error::NegotiationError;
use crate::http::media_type_essence;
use crate::http::request::Request;

/// Inbound content-type negotiation against an ordered allow-list.
///
/// The declared type matches when its media-type essence equals an entry,
/// ignoring ASCII case. A request that declares nothing is rejected the same
/// way as one that declares a type outside the list.
pub struct Validator<'a> {
    allowed: &'a [String],
}

impl<'a> Validator<'a> {
    pub fn new(allowed: &'a [String]) -> Self {
        Self { allowed }
    }

    /// Returns the allow-list entry the request matched.
    pub fn negotiate(&self, req: &Request) -> Result<&'a str, NegotiationError> {
        let declared = req.content_type().ok_or(NegotiationError::Missing)?;
        self.match_type(declared)
    }

    pub fn match_type(&self, declared: &str) -> Result<&'a str, NegotiationError> {
        let essence = media_type_essence(declared);
        self.allowed
            .iter()
            .find(|allowed| allowed.eq_ignore_ascii_case(essence))
            .map(String::as_str)
            .ok_or_else(|| NegotiationError::Unsupported(declared.to_string()))
    }

    /// Value of the `Accept` header sent with a 415.
    pub fn accept_header(&self) -> String {
        self.allowed.join(", ")
    }
}
