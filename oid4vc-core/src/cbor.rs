use ciborium::value::Value;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CborError {
    #[error("malformed CBOR: {0}")]
    Malformed(String),
    #[error("unsupported CBOR item: {0}")]
    Unsupported(String),
    #[error("integer out of range")]
    IntegerOutOfRange,
    #[error("invalid IssuerSigned structure: {0}")]
    InvalidIssuerSigned(&'static str),
}

/// A fully decoded CBOR element. Construction traverses all children, so a
/// value of this type is never partially valid.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Bytes(Vec<u8>),
    Text(String),
    Uint(u64),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    Array(Vec<Element>),
    Map(Vec<(Element, Element)>),
    Tagged(u64, Box<Element>),
}

impl Element {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CborError> {
        let value: Value =
            ciborium::de::from_reader(bytes).map_err(|e| CborError::Malformed(e.to_string()))?;
        Self::from_cbor(value)
    }

    pub fn from_cbor(value: Value) -> Result<Self, CborError> {
        match value {
            Value::Bytes(bytes) => Ok(Element::Bytes(bytes)),
            Value::Text(text) => Ok(Element::Text(text)),
            Value::Integer(integer) => {
                let integer = i128::from(integer);
                if integer >= 0 {
                    u64::try_from(integer)
                        .map(Element::Uint)
                        .map_err(|_| CborError::IntegerOutOfRange)
                } else {
                    i64::try_from(integer)
                        .map(Element::Int)
                        .map_err(|_| CborError::IntegerOutOfRange)
                }
            }
            Value::Float(float) => Ok(Element::Float(float)),
            Value::Bool(bool) => Ok(Element::Bool(bool)),
            Value::Null => Ok(Element::Null),
            Value::Array(values) => values
                .into_iter()
                .map(Self::from_cbor)
                .collect::<Result<_, _>>()
                .map(Element::Array),
            Value::Map(entries) => entries
                .into_iter()
                .map(|(key, value)| Ok((Self::from_cbor(key)?, Self::from_cbor(value)?)))
                .collect::<Result<_, _>>()
                .map(Element::Map),
            Value::Tag(tag, inner) => Ok(Element::Tagged(tag, Box::new(Self::from_cbor(*inner)?))),
            other => Err(CborError::Unsupported(format!("{other:?}"))),
        }
    }

    /// Look up a text key in a map element.
    pub fn get(&self, key: &str) -> Option<&Element> {
        match self {
            Element::Map(entries) => entries.iter().find_map(|(k, v)| match k {
                Element::Text(text) if text == key => Some(v),
                _ => None,
            }),
            _ => None,
        }
    }
}

/// Check that `bytes` decode to an ISO 18013-5 `IssuerSigned` map: a
/// `nameSpaces` entry and an `issuerAuth` COSE_Sign1 (a four-element array,
/// optionally tag 18).
pub fn validate_issuer_signed(bytes: &[u8]) -> Result<(), CborError> {
    let element = Element::from_slice(bytes)?;
    if !matches!(element, Element::Map(_)) {
        return Err(CborError::InvalidIssuerSigned("top-level value is not a map"));
    }
    element
        .get("nameSpaces")
        .ok_or(CborError::InvalidIssuerSigned("missing nameSpaces"))?;
    let issuer_auth = element
        .get("issuerAuth")
        .ok_or(CborError::InvalidIssuerSigned("missing issuerAuth"))?;
    let issuer_auth = match issuer_auth {
        Element::Tagged(18, inner) => inner.as_ref(),
        other => other,
    };
    match issuer_auth {
        Element::Array(items) if items.len() == 4 => Ok(()),
        _ => Err(CborError::InvalidIssuerSigned("issuerAuth is not a COSE_Sign1")),
    }
}
