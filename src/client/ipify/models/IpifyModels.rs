use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct IpLookupResponse {
    pub ip: String,
}
