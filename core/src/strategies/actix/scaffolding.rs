#![deny(missing_docs)]

//! # Scaffolding
//!
//! Logic for generating handler signatures, imports and response expressions.

use crate::strategies::traits::ResponseStatus;

/// Generic parameter list shared by handlers and route configuration.
pub const HANDLER_GENERICS: &str = "<D: Database + 'static>";

/// Returns the item paths every generated route file imports.
pub fn route_imports() -> Vec<&'static str> {
    vec!["actix_web::web", "actix_web::HttpResponse"]
}

/// Generates the handler function signature, generic over the database driver.
pub fn handler_signature(func_name: &str, args: &[String]) -> String {
    let args_str = args
        .iter()
        .map(|a| format!("    {},\n", a))
        .collect::<String>();
    format!(
        "pub async fn {}{}(\n{}) -> Result<HttpResponse, ServiceError> {{\n",
        func_name, HANDLER_GENERICS, args_str
    )
}

/// Wraps `expr` into a JSON response with the given status.
pub fn respond(status: ResponseStatus, expr: &str) -> String {
    let builder = match status {
        ResponseStatus::Ok => "Ok",
        ResponseStatus::Created => "Created",
    };
    format!("Ok(HttpResponse::{}().json({}))", builder, expr)
}
