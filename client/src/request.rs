use qmpctl_spec::{to_document, Execute};

use crate::{args::Arguments, error::Result};

/// A command ready to be written to the control channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `{"execute": "<name>"}`
    Simple {
        name: String,
    },
    /// `execute` plus an `arguments` object, one member per line.
    WithArguments {
        name: String,
        arguments: Arguments,
    },
}

impl Request {
    pub fn simple(name: impl Into<String>) -> Self {
        Request::Simple {
            name: name.into(),
        }
    }

    /// Falls back to the simple form when `arguments` is empty.
    pub fn with_arguments(name: impl Into<String>, arguments: Arguments) -> Self {
        let name = name.into();
        if arguments.is_empty() {
            Request::Simple { name }
        } else {
            Request::WithArguments { name, arguments }
        }
    }

    /// The document text, without the line delimiter.
    pub fn render(&self) -> Result<String> {
        match self {
            Request::Simple { name } => to_document(&Execute::new(name)).map_err(From::from),
            Request::WithArguments { name, arguments } => {
                let members = arguments.iter()
                    .map(|arg| -> Result<String> {
                        Ok(format!("    {}: {}", serde_json::to_string(&arg.key)?, arg.value))
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(format!(
                    "{{\n  \"execute\": {},\n  \"arguments\": {{\n{}\n  }}\n}}",
                    serde_json::to_string(name)?,
                    members.join(",\n"),
                ))
            },
        }
    }
}
