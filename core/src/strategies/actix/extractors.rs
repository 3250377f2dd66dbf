#![deny(missing_docs)]

//! # Extractors
//!
//! Logic for generating Rust type strings that Actix uses to extract data
//! from requests (Path, Query, Json, Data).

/// Argument declaration for the application-owned database handle.
pub fn database_extractor() -> String {
    "db: web::Data<D>".to_string()
}

/// Generates the type string for path parameters.
pub fn path_extractor(inner_types: &[&str]) -> String {
    if inner_types.len() == 1 {
        format!("web::Path<{}>", inner_types[0])
    } else {
        let tuple = inner_types.join(", ");
        format!("web::Path<({})>", tuple)
    }
}

/// Generates the type string for typed query extraction.
pub fn query_extractor(inner_type: &str) -> String {
    format!("web::Query<{}>", inner_type)
}

/// Generates the type string for JSON body extraction.
pub fn body_extractor(body_type: &str) -> String {
    format!("web::Json<{}>", body_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_extractor() {
        assert_eq!(path_extractor(&["String"]), "web::Path<String>");
        assert_eq!(
            path_extractor(&["String", "String"]),
            "web::Path<(String, String)>"
        );
    }

    #[test]
    fn test_simple_extractors() {
        assert_eq!(query_extractor("TeamListQuery"), "web::Query<TeamListQuery>");
        assert_eq!(body_extractor("TeamCreate"), "web::Json<TeamCreate>");
        assert_eq!(database_extractor(), "db: web::Data<D>");
    }
}
