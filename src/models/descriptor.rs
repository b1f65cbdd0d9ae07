//! Client descriptor
//!
//! Immutable, shared description of one configured client type: its timing
//! policy, header/query templates, operations, error handlers and
//! paginators. Built once through [`DescriptorBuilder`], which rejects
//! inconsistent configurations before any call can be made.

use crate::config::ClientConfig;
use crate::models::{
    ApiMethodProperties, ErrorHandlerSpec, FieldTemplate, HeaderPart, PaginatorSpec, QueryPart,
};
use crate::services::pagination::resolve_paginator;
use crate::utils::error::{helpers::config_error, ApiResult};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Instantiation key overriding the configured suffix
pub const SUFFIX_FIELD: &str = "suffix";

#[derive(Debug)]
pub struct ClientDescriptor {
    name: String,
    config: ClientConfig,
    headers: Vec<HeaderPart>,
    queries: Vec<QueryPart>,
    methods: BTreeMap<String, ApiMethodProperties>,
    error_handlers: Vec<ErrorHandlerSpec>,
    paginators: Vec<PaginatorSpec>,
    /// Operation name to index into `paginators`, for paginated operations
    paginator_index: HashMap<String, usize>,
}

impl ClientDescriptor {
    pub fn builder(name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn headers(&self) -> &[HeaderPart] {
        &self.headers
    }

    pub fn queries(&self) -> &[QueryPart] {
        &self.queries
    }

    pub fn method(&self, operation: &str) -> Option<&ApiMethodProperties> {
        self.methods.get(operation)
    }

    /// Declared operation names, sorted
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Error handlers in declaration order
    pub fn error_handlers(&self) -> &[ErrorHandlerSpec] {
        &self.error_handlers
    }

    pub fn paginators(&self) -> &[PaginatorSpec] {
        &self.paginators
    }

    /// Paginator resolved for a paginated operation at build time
    pub fn paginator_for(&self, operation: &str) -> Option<&PaginatorSpec> {
        self.paginator_index
            .get(operation)
            .and_then(|&index| self.paginators.get(index))
    }
}

/// Registers templates, operations, handlers and paginators into a descriptor
#[derive(Debug)]
pub struct DescriptorBuilder {
    name: String,
    config: ClientConfig,
    headers: Vec<HeaderPart>,
    queries: Vec<QueryPart>,
    methods: Vec<(String, ApiMethodProperties)>,
    error_handlers: Vec<ErrorHandlerSpec>,
    paginators: Vec<PaginatorSpec>,
}

impl DescriptorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: ClientConfig::default(),
            headers: Vec::new(),
            queries: Vec::new(),
            methods: Vec::new(),
            error_handlers: Vec::new(),
            paginators: Vec::new(),
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn header(mut self, part: HeaderPart) -> Self {
        self.headers.push(part);
        self
    }

    pub fn headers(mut self, parts: impl IntoIterator<Item = HeaderPart>) -> Self {
        self.headers.extend(parts);
        self
    }

    pub fn query(mut self, part: QueryPart) -> Self {
        self.queries.push(part);
        self
    }

    pub fn queries(mut self, parts: impl IntoIterator<Item = QueryPart>) -> Self {
        self.queries.extend(parts);
        self
    }

    /// Register an operation under the name it is invoked by
    pub fn method(mut self, operation: impl Into<String>, properties: ApiMethodProperties) -> Self {
        self.methods.push((operation.into(), properties));
        self
    }

    pub fn error_handler(mut self, spec: ErrorHandlerSpec) -> Self {
        self.error_handlers.push(spec);
        self
    }

    pub fn paginator(mut self, spec: PaginatorSpec) -> Self {
        self.paginators.push(spec);
        self
    }

    /// Validate and freeze the descriptor
    pub fn build(self) -> ApiResult<Arc<ClientDescriptor>> {
        self.config.validate()?;

        self.check_templates(&self.headers, "header")?;
        self.check_templates(&self.queries, "query")?;

        let mut methods = BTreeMap::new();
        for (operation, properties) in self.methods {
            if operation.is_empty() {
                return Err(config_error("Operation name cannot be empty"));
            }
            if properties.ok_codes.is_empty() {
                return Err(config_error(format!(
                    "Operation '{}' must declare at least one ok code",
                    operation
                )));
            }
            let overlap = properties.overlapping_codes();
            if !overlap.is_empty() {
                return Err(config_error(format!(
                    "Operation '{}' lists codes {:?} as both ok and error codes",
                    operation, overlap
                )));
            }
            if methods.insert(operation.clone(), properties).is_some() {
                return Err(config_error(format!("Duplicate operation '{}'", operation)));
            }
        }

        for (index, spec) in self.error_handlers.iter().enumerate() {
            for operation in &spec.api_methods {
                if !methods.contains_key(operation) {
                    return Err(config_error(format!(
                        "Error handler #{} refers to unknown operation '{}'",
                        index, operation
                    )));
                }
            }
        }

        for (index, spec) in self.paginators.iter().enumerate() {
            for operation in &spec.api_methods {
                if !methods.contains_key(operation) {
                    return Err(config_error(format!(
                        "Paginator #{} refers to unknown operation '{}'",
                        index, operation
                    )));
                }
            }
        }

        let mut paginator_index = HashMap::new();
        for (operation, properties) in &methods {
            if properties.pagination {
                let index = resolve_paginator(&self.paginators, operation)?;
                debug!("Operation '{}' paginated by paginator #{}", operation, index);
                paginator_index.insert(operation.clone(), index);
            }
        }

        info!(
            "Client descriptor '{}' built: {} operations, {} error handlers, {} paginators",
            self.name,
            methods.len(),
            self.error_handlers.len(),
            self.paginators.len()
        );

        Ok(Arc::new(ClientDescriptor {
            name: self.name,
            config: self.config,
            headers: self.headers,
            queries: self.queries,
            methods,
            error_handlers: self.error_handlers,
            paginators: self.paginators,
            paginator_index,
        }))
    }

    fn check_templates<T: FieldTemplate>(&self, parts: &[T], kind: &str) -> ApiResult<()> {
        let reserved: HashSet<&str> = [self.config.rename_base_field.as_str(), SUFFIX_FIELD]
            .into_iter()
            .collect();

        for part in parts {
            if part.key().is_empty() {
                return Err(config_error(format!("Empty {} key", kind)));
            }
            if reserved.contains(part.key()) {
                return Err(config_error(format!(
                    "The {} key '{}' clashes with a reserved instantiation field",
                    kind,
                    part.key()
                )));
            }
        }
        Ok(())
    }
}
