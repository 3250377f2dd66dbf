#![deny(missing_docs)]

//! # Custom Endpoint Injection
//!
//! Splices user-written fragments into freshly rendered artifacts:
//!
//! - service methods go before the closing brace of the service `impl` block,
//! - route handlers are appended to the route file,
//! - route registrations go into the `custom_routes` hook.
//!
//! Every insertion is guarded by an AST lookup for an existing function or
//! registration of the same name, so injecting twice never duplicates code.
//! Missing fragments are warnings; the entity still completes.

pub mod fragments;

use crate::error::{AppError, AppResult};
use crate::registry::InsertOutcome;
use crate::render::route::CUSTOM_ROUTES_FN;
use crate::render::service::service_type;
use crate::render::{ArtifactKind, GeneratedArtifact};
use crate::schema::{CustomEndpoint, EntityDescriptor};
use crate::strategies::{BackendStrategy, RouteBinding};
use fragments::{FragmentContext, FragmentKind, FragmentStore};
use ra_ap_edition::Edition;
use ra_ap_syntax::ast::{self, HasModuleItem, HasName};
use ra_ap_syntax::{AstNode, SourceFile, SyntaxKind, SyntaxToken};
use std::fmt::Display;
use tracing::{debug, info, warn};

/// What happened to one half of a custom endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectionOutcome {
    /// The fragment was inserted.
    Inserted,
    /// A function with the same name already existed; nothing was inserted.
    AlreadyPresent,
    /// No fragment template was found.
    MissingFragment,
    /// The endpoint does not expose a route.
    NotExposed,
    /// The fragment could not be rendered or did not define the expected function.
    Failed(String),
}

impl From<InsertOutcome> for InjectionOutcome {
    fn from(outcome: InsertOutcome) -> Self {
        match outcome {
            InsertOutcome::Inserted => InjectionOutcome::Inserted,
            InsertOutcome::AlreadyPresent => InjectionOutcome::AlreadyPresent,
        }
    }
}

impl Display for InjectionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InjectionOutcome::Inserted => write!(f, "inserted"),
            InjectionOutcome::AlreadyPresent => write!(f, "already present"),
            InjectionOutcome::MissingFragment => write!(f, "missing fragment"),
            InjectionOutcome::NotExposed => write!(f, "not exposed"),
            InjectionOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Per-endpoint injection result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointReport {
    /// Endpoint name.
    pub name: String,
    /// Service method outcome.
    pub service: InjectionOutcome,
    /// Route handler outcome (covers the registration too).
    pub route: InjectionOutcome,
}

fn parse(source: &str) -> SourceFile {
    SourceFile::parse(source, Edition::Edition2021).tree()
}

fn parse_checked(label: &str, source: &str) -> AppResult<SourceFile> {
    let parse = SourceFile::parse(source, Edition::Edition2021);
    if !parse.errors().is_empty() {
        let errs: Vec<String> = parse.errors().into_iter().map(|e| e.to_string()).collect();
        return Err(AppError::Render(format!(
            "{} does not parse: {}",
            label,
            errs.join(", ")
        )));
    }
    Ok(parse.tree())
}

/// Offset right before the whitespace that precedes `r_curly`, so inserted
/// code keeps the closing brace on its own line.
fn insert_point(r_curly: &SyntaxToken) -> usize {
    match r_curly.prev_token() {
        Some(prev) if prev.kind() == SyntaxKind::WHITESPACE => prev.text_range().start().into(),
        _ => r_curly.text_range().start().into(),
    }
}

fn indent(code: &str, prefix: &str) -> String {
    code.trim()
        .lines()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                format!("{}{}", prefix, l)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn impl_self_name(imp: &ast::Impl) -> Option<String> {
    match imp.self_ty()? {
        ast::Type::PathType(p) => Some(p.path()?.segment()?.name_ref()?.text().to_string()),
        _ => None,
    }
}

fn defines_fn(list: &ast::AssocItemList, name: &str) -> bool {
    list.assoc_items().any(|item| match item {
        ast::AssocItem::Fn(f) => f.name().is_some_and(|n| n.text() == name),
        _ => false,
    })
}

fn find_top_level_fn(file: &SourceFile, name: &str) -> Option<ast::Fn> {
    file.items().find_map(|item| match item {
        ast::Item::Fn(f) if f.name().is_some_and(|n| n.text() == name) => Some(f),
        _ => None,
    })
}

/// Inserts a method fragment into the inherent impl block of `service_type`.
///
/// The fragment must define `method_name`. Returns the updated source, or the
/// original one with [`InsertOutcome::AlreadyPresent`] when the impl already
/// has a method of that name.
pub fn insert_service_method(
    source: &str,
    service_type: &str,
    method_name: &str,
    fragment: &str,
) -> AppResult<(String, InsertOutcome)> {
    let file = parse(source);
    let imp = file
        .syntax()
        .descendants()
        .filter_map(ast::Impl::cast)
        .find(|i| i.trait_().is_none() && impl_self_name(i).as_deref() == Some(service_type))
        .ok_or_else(|| AppError::Render(format!("no impl block for {}", service_type)))?;
    let items = imp
        .assoc_item_list()
        .ok_or_else(|| AppError::Render(format!("impl {} has no body", service_type)))?;

    if defines_fn(&items, method_name) {
        return Ok((source.to_string(), InsertOutcome::AlreadyPresent));
    }

    let wrapped = parse_checked(
        &format!("fragment '{}'", method_name),
        &format!("impl Fragment {{\n{}\n}}\n", fragment),
    )?;
    let defines = wrapped
        .syntax()
        .descendants()
        .filter_map(ast::AssocItemList::cast)
        .any(|list| defines_fn(&list, method_name));
    if !defines {
        return Err(AppError::Render(format!(
            "fragment does not define fn {}",
            method_name
        )));
    }

    let r_curly = items
        .r_curly_token()
        .ok_or_else(|| AppError::Render(format!("missing }} in impl {}", service_type)))?;
    let pos = insert_point(&r_curly);
    let mut out = source.to_string();
    out.insert_str(pos, &format!("\n\n{}", indent(fragment, "    ")));
    Ok((out, InsertOutcome::Inserted))
}

/// Appends a handler fragment to the route file unless `handler_name` already exists.
pub fn insert_route_handler(
    source: &str,
    handler_name: &str,
    fragment: &str,
) -> AppResult<(String, InsertOutcome)> {
    if find_top_level_fn(&parse(source), handler_name).is_some() {
        return Ok((source.to_string(), InsertOutcome::AlreadyPresent));
    }

    let frag = parse_checked(&format!("fragment '{}'", handler_name), fragment)?;
    if find_top_level_fn(&frag, handler_name).is_none() {
        return Err(AppError::Render(format!(
            "fragment does not define fn {}",
            handler_name
        )));
    }

    let mut out = source.trim_end().to_string();
    out.push_str("\n\n");
    out.push_str(fragment.trim());
    out.push('\n');
    Ok((out, InsertOutcome::Inserted))
}

/// Registers `binding` inside the custom route hook unless its handler is already referenced there.
pub fn register_custom_route(
    source: &str,
    binding: &RouteBinding,
    strategy: &impl BackendStrategy,
) -> AppResult<(String, InsertOutcome)> {
    let file = parse(source);
    let hook = find_top_level_fn(&file, CUSTOM_ROUTES_FN)
        .ok_or_else(|| AppError::Render(format!("could not find '{}' to patch", CUSTOM_ROUTES_FN)))?;
    let body = hook
        .body()
        .ok_or_else(|| AppError::Render(format!("'{}' has no body", CUSTOM_ROUTES_FN)))?;

    let registered = body
        .syntax()
        .descendants_with_tokens()
        .filter_map(|e| e.into_token())
        .any(|t| t.kind() == SyntaxKind::IDENT && t.text() == binding.handler);
    if registered {
        return Ok((source.to_string(), InsertOutcome::AlreadyPresent));
    }

    let r_curly = body
        .syntax()
        .last_token()
        .filter(|t| t.kind() == SyntaxKind::R_CURLY)
        .ok_or_else(|| AppError::Render(format!("missing }} in '{}'", CUSTOM_ROUTES_FN)))?;
    let pos = insert_point(&r_curly);
    let mut out = source.to_string();
    out.insert_str(pos, &strategy.route_registration_statement(binding));
    Ok((out, InsertOutcome::Inserted))
}

fn render_fragment(
    store: &FragmentStore,
    entity: &EntityDescriptor,
    endpoint: &CustomEndpoint,
    kind: FragmentKind,
) -> Option<AppResult<String>> {
    let path = store.locate(&entity.entity_name, &endpoint.name, kind)?;
    debug!(fragment = %path.display(), "Rendering custom fragment");
    Some(store.render(&path, &FragmentContext::new(entity, endpoint)))
}

fn inject_service(
    source: &mut String,
    store: &FragmentStore,
    entity: &EntityDescriptor,
    endpoint: &CustomEndpoint,
) -> InjectionOutcome {
    let rendered = match render_fragment(store, entity, endpoint, FragmentKind::ServiceMethod) {
        Some(r) => r,
        None => return InjectionOutcome::MissingFragment,
    };
    let result = rendered.and_then(|fragment| {
        insert_service_method(source, &service_type(entity), &endpoint.name, &fragment)
    });
    match result {
        Ok((updated, outcome)) => {
            *source = updated;
            outcome.into()
        }
        Err(e) => InjectionOutcome::Failed(e.to_string()),
    }
}

fn inject_route(
    source: &mut String,
    store: &FragmentStore,
    entity: &EntityDescriptor,
    endpoint: &CustomEndpoint,
    strategy: &impl BackendStrategy,
) -> InjectionOutcome {
    if !endpoint.expose_route {
        return InjectionOutcome::NotExposed;
    }
    let rendered = match render_fragment(store, entity, endpoint, FragmentKind::RouteHandler) {
        Some(r) => r,
        None => return InjectionOutcome::MissingFragment,
    };
    let handler = endpoint.handler_name(&entity.entity_name);
    let binding = RouteBinding::new(endpoint.http_method, endpoint.route_path.clone(), handler.clone());
    let result = rendered
        .and_then(|fragment| insert_route_handler(source, &handler, &fragment))
        .and_then(|(with_handler, handler_outcome)| {
            let (updated, _) = register_custom_route(&with_handler, &binding, strategy)?;
            Ok((updated, handler_outcome))
        });
    match result {
        Ok((updated, outcome)) => {
            *source = updated;
            outcome.into()
        }
        Err(e) => InjectionOutcome::Failed(e.to_string()),
    }
}

/// Injects every custom endpoint of `entity` into its rendered service and route artifacts.
///
/// Fragment problems are reported per endpoint and logged as warnings; the
/// only error is a missing service or route artifact.
pub fn inject_custom_endpoints(
    entity: &EntityDescriptor,
    store: &FragmentStore,
    strategy: &impl BackendStrategy,
    artifacts: &mut [GeneratedArtifact],
) -> AppResult<Vec<EndpointReport>> {
    if entity.custom_endpoints.is_empty() {
        return Ok(Vec::new());
    }

    let mut service_src = artifact_content(artifacts, ArtifactKind::Service)?;
    let mut route_src = artifact_content(artifacts, ArtifactKind::Route)?;

    let mut reports = Vec::new();
    for endpoint in &entity.custom_endpoints {
        let report = EndpointReport {
            name: endpoint.name.clone(),
            service: inject_service(&mut service_src, store, entity, endpoint),
            route: inject_route(&mut route_src, store, entity, endpoint, strategy),
        };

        for (half, outcome) in [("service", &report.service), ("route", &report.route)] {
            match outcome {
                InjectionOutcome::Inserted => info!(
                    entity = %entity.entity_name,
                    endpoint = %endpoint.name,
                    "Injected custom {} fragment", half
                ),
                InjectionOutcome::MissingFragment => warn!(
                    entity = %entity.entity_name,
                    endpoint = %endpoint.name,
                    "No {} fragment found in {}", half, store.root().display()
                ),
                InjectionOutcome::AlreadyPresent => info!(
                    entity = %entity.entity_name,
                    endpoint = %endpoint.name,
                    "Skipped custom {} fragment: a function with that name already exists", half
                ),
                InjectionOutcome::Failed(reason) => warn!(
                    entity = %entity.entity_name,
                    endpoint = %endpoint.name,
                    "Custom {} fragment not injected: {}", half, reason
                ),
                InjectionOutcome::NotExposed => {}
            }
        }
        reports.push(report);
    }

    for artifact in artifacts.iter_mut() {
        match artifact.kind {
            ArtifactKind::Service => artifact.content = std::mem::take(&mut service_src),
            ArtifactKind::Route => artifact.content = std::mem::take(&mut route_src),
            ArtifactKind::Model => {}
        }
    }
    Ok(reports)
}

fn artifact_content(artifacts: &[GeneratedArtifact], kind: ArtifactKind) -> AppResult<String> {
    artifacts
        .iter()
        .find(|a| a.kind == kind)
        .map(|a| a.content.clone())
        .ok_or_else(|| AppError::Render(format!("no {} artifact to inject into", kind)))
}
