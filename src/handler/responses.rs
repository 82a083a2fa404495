use crate::http::TEXT_HTML;
use crate::http::response::ResponseParts;
use crate::http::status::HttpStatus;

// Terminal replies built by the dispatcher itself. None of them has a body,
// and they never pass through middleware.

pub fn unsupported_media_type(accept: &str) -> ResponseParts {
    let mut res = ResponseParts::empty(HttpStatus::UnsupportedMediaType);
    res.headers.set("Content-Type", TEXT_HTML);
    res.headers.set("Accept", accept);
    res
}

pub fn any_error(status: HttpStatus, content_type: &str) -> ResponseParts {
    let mut res = ResponseParts::empty(status);
    res.headers.set("Content-Type", content_type);
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_media_type_lists_accepted_types() {
        let res = unsupported_media_type("application/json, text/html");
        assert_eq!(res.status_line(), "415 Unsupported Media Type");
        assert!(res.body.is_empty());
        assert_eq!(
            res.headers.to_pairs(),
            vec![
                ("Content-Type".to_string(), "text/html".to_string()),
                (
                    "Accept".to_string(),
                    "application/json, text/html".to_string()
                ),
            ]
        );
    }

    #[test]
    fn route_errors_carry_given_content_type() {
        let res = any_error(HttpStatus::NotFound, "application/json");
        assert_eq!(res.status, HttpStatus::NotFound);
        assert_eq!(res.headers.get("Content-Type"), Some("application/json"));

        let res = any_error(HttpStatus::MethodNotAllowed, "text/html");
        assert_eq!(res.status_line(), "405 Method Not Allowed");
        assert_eq!(res.headers.len(), 1);
    }
}
