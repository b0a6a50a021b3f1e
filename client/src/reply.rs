use std::{borrow::Cow, collections::BTreeMap, iter::FromIterator};

use serde::de::DeserializeOwned;
use qmpctl_spec::{ChardevInfo, Response};

use crate::error::{Error, Result};

/// One line received from the peer, without its delimiter.
///
/// Most replies are only ever shown to the user, so the bytes are kept as
/// they arrived and decoded on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    line: Vec<u8>,
}

impl Reply {
    pub fn new(line: Vec<u8>) -> Self {
        Reply {
            line,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.line
    }

    /// Lossy text view for display.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.line)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.line).map_err(From::from)
    }

    /// Decodes a `{"return": ...}` reply, turning an `{"error": ...}` reply
    /// into [`Error::Qmp`].
    pub fn result<T: DeserializeOwned>(&self) -> Result<T> {
        self.decode::<Response<T>>()?
            .result()
            .map_err(From::from)
    }
}

/// `query-chardev` reply, indexed by label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChardevMap {
    devices: BTreeMap<String, ChardevInfo>,
}

impl ChardevMap {
    pub fn from_reply(reply: &Reply) -> Result<Self> {
        let devices: Vec<ChardevInfo> = reply.result().map_err(|e| match e {
            Error::Json { source } => Error::protocol(format!("malformed query-chardev reply: {}", source)),
            e => e,
        })?;

        Ok(devices.into_iter().collect())
    }

    pub fn get(&self, label: &str) -> Option<&ChardevInfo> {
        self.devices.get(label)
    }

    /// Host-side path of the device labelled `label`.
    pub fn host_path(&self, label: &str) -> Result<&str> {
        self.get(label)
            .map(ChardevInfo::host_path)
            .ok_or_else(|| Error::Lookup { label: label.into() })
    }

    /// Resolves every label in order, failing on the first one that is absent.
    pub fn host_paths<I, T>(&self, labels: I) -> Result<Vec<&str>> where
        I: IntoIterator<Item=T>,
        T: AsRef<str>,
    {
        labels.into_iter()
            .map(|label| self.host_path(label.as_ref()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Later entries replace earlier ones with the same label.
impl FromIterator<ChardevInfo> for ChardevMap {
    fn from_iter<I: IntoIterator<Item=ChardevInfo>>(iter: I) -> Self {
        ChardevMap {
            devices: iter.into_iter()
                .map(|dev| (dev.label.clone(), dev))
                .collect(),
        }
    }
}
