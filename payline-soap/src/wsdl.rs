//! Service description (WSDL 1.1) loading.
//!
//! Only what is needed to route calls is kept: the target namespace and,
//! per operation, the address of the port exposing it and its SOAP action.

use std::collections::HashMap;
use std::path::PathBuf;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use url::Url;

use crate::{Result, SoapError};

/// Where to load a service description from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsdlSource {
    /// A description compiled into the binary.
    Bundled(&'static str),
    /// A description held in memory.
    Inline(String),
    /// A remote description fetched over HTTP(S).
    Url(String),
    /// A description on the local filesystem.
    Path(PathBuf),
}

impl WsdlSource {
    /// Interpret a location string as a URL when it has an HTTP scheme,
    /// and as a filesystem path otherwise.
    pub fn from_location(location: impl Into<String>) -> Self {
        let location = location.into();
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Url(location)
        } else {
            Self::Path(PathBuf::from(location))
        }
    }

    /// Read the raw description text.
    pub async fn fetch(&self, http: &reqwest::Client) -> Result<String> {
        match self {
            Self::Bundled(text) => Ok((*text).to_string()),
            Self::Inline(text) => Ok(text.clone()),
            Self::Url(url) => {
                let response = http.get(url).send().await?;
                let status = response.status();
                let body = response.text().await?;
                if !status.is_success() {
                    return Err(SoapError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }
                Ok(body)
            }
            Self::Path(path) => Ok(tokio::fs::read_to_string(path).await?),
        }
    }
}

/// Where and how to invoke one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Port address.
    pub address: String,
    /// SOAP action header value.
    pub soap_action: String,
    /// Name of the service declaring the port.
    pub service: String,
}

/// Parsed service description.
#[derive(Debug, Clone)]
pub struct ServiceDescription {
    target_namespace: String,
    operations: HashMap<String, Endpoint>,
}

#[derive(Default)]
struct Binding {
    name: String,
    operations: Vec<(String, String)>,
}

struct Port {
    service: String,
    binding: String,
    address: Option<String>,
}

impl ServiceDescription {
    /// Parse a WSDL 1.1 document.
    ///
    /// Operations exposed by several services resolve to the first one.
    pub fn parse(wsdl: &str) -> Result<Self> {
        let mut reader = Reader::from_str(wsdl);
        reader.config_mut().trim_text(true);

        let mut path: Vec<String> = Vec::new();
        let mut target_namespace = String::new();
        let mut bindings: Vec<Binding> = Vec::new();
        let mut ports: Vec<Port> = Vec::new();
        let mut service = String::new();

        loop {
            let (start, empty) = match reader.read_event()? {
                Event::Start(start) => (start, false),
                Event::Empty(start) => (start, true),
                Event::End(_) => {
                    path.pop();
                    continue;
                }
                Event::Eof => break,
                _ => continue,
            };

            let name = local_name(&start)?;
            let parent = path.last().map(String::as_str);
            let grandparent = path.len().checked_sub(2).and_then(|i| path.get(i)).map(String::as_str);

            match (name.as_str(), parent, grandparent) {
                ("definitions", None, _) => {
                    target_namespace = attribute(&start, "targetNamespace")?.unwrap_or_default();
                }
                ("binding", Some("definitions"), _) => bindings.push(Binding {
                    name: attribute(&start, "name")?.unwrap_or_default(),
                    operations: Vec::new(),
                }),
                ("operation", Some("binding"), _) => {
                    let operation = attribute(&start, "name")?.unwrap_or_default();
                    if let Some(binding) = bindings.last_mut() {
                        binding.operations.push((operation, String::new()));
                    }
                }
                ("operation", Some("operation"), Some("binding")) => {
                    let action = attribute(&start, "soapAction")?.unwrap_or_default();
                    if let Some((_, soap_action)) =
                        bindings.last_mut().and_then(|b| b.operations.last_mut())
                    {
                        *soap_action = action;
                    }
                }
                ("service", Some("definitions"), _) => {
                    service = attribute(&start, "name")?.unwrap_or_default();
                }
                ("port", Some("service"), _) => ports.push(Port {
                    service: service.clone(),
                    binding: strip_prefix(&attribute(&start, "binding")?.unwrap_or_default()),
                    address: None,
                }),
                ("address", Some("port"), _) => {
                    if let Some(port) = ports.last_mut() {
                        port.address = attribute(&start, "location")?;
                    }
                }
                _ => {}
            }

            if !empty {
                path.push(name);
            }
        }

        if ports.is_empty() {
            return Err(SoapError::Description("no service port declared".to_string()));
        }

        let mut operations = HashMap::new();
        for port in &ports {
            let Some(address) = &port.address else {
                continue;
            };
            let Some(binding) = bindings.iter().find(|b| b.name == port.binding) else {
                continue;
            };
            for (operation, soap_action) in &binding.operations {
                operations.entry(operation.clone()).or_insert_with(|| Endpoint {
                    address: address.clone(),
                    soap_action: soap_action.clone(),
                    service: port.service.clone(),
                });
            }
        }

        if operations.is_empty() {
            return Err(SoapError::Description("no operation bound to a port".to_string()));
        }

        Ok(Self {
            target_namespace,
            operations,
        })
    }

    /// Get the target namespace.
    pub fn target_namespace(&self) -> &str {
        &self.target_namespace
    }

    /// Get the endpoint for an operation.
    pub fn endpoint(&self, operation: &str) -> Option<&Endpoint> {
        self.operations.get(operation)
    }

    /// Check whether an operation is declared.
    pub fn has_operation(&self, operation: &str) -> bool {
        self.operations.contains_key(operation)
    }

    /// Iterate over declared operation names.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    /// Point every endpoint at another host, keeping the paths.
    pub fn override_endpoint(&mut self, base: &str) -> Result<()> {
        let base = Url::parse(base)?;
        for endpoint in self.operations.values_mut() {
            let original = Url::parse(&endpoint.address)?;
            endpoint.address = base.join(original.path())?.to_string();
        }
        Ok(())
    }
}

fn local_name(start: &BytesStart<'_>) -> Result<String> {
    std::str::from_utf8(start.local_name().as_ref())
        .map(str::to_string)
        .map_err(|e| SoapError::Xml(e.to_string()))
}

fn attribute(start: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    for attr in start.attributes() {
        let attr = attr.map_err(|e| SoapError::Xml(e.to_string()))?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            let value = std::str::from_utf8(&attr.value).map_err(|e| SoapError::Xml(e.to_string()))?;
            return Ok(Some(value.to_string()));
        }
    }
    Ok(None)
}

fn strip_prefix(qualified: &str) -> String {
    qualified
        .rsplit_once(':')
        .map(|(_, local)| local)
        .unwrap_or(qualified)
        .to_string()
}
