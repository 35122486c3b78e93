use super::*;

/// HTTP client for the off-chain gateway: ships serialized request
/// programs (and DNSSEC lookup requests) to each configured URL in
/// order, first success wins.
pub struct Client {
  http: reqwest::blocking::Client,
  urls: Vec<String>,
}

#[derive(Serialize)]
struct DnsQuery<'a> {
  name: &'a str,
}

#[derive(Deserialize)]
struct DnsProof {
  proof: String,
}

impl Client {
  pub fn new(urls: Vec<String>) -> Self {
    Self {
      http: reqwest::blocking::Client::new(),
      urls,
    }
  }

  fn post<T: serde::de::DeserializeOwned>(
    &self,
    path: &str,
    body: &impl Serialize,
  ) -> Result<T, ResolveError> {
    let mut last = None;

    for url in &self.urls {
      let result = self
        .http
        .post(format!("{}/{path}", url.trim_end_matches('/')))
        .json(body)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.json::<T>());

      match result {
        Ok(response) => return Ok(response),
        Err(error) => {
          log::warn!("gateway {url} failed: {error}");
          last = Some(error);
        }
      }
    }

    Err(ResolveError::Gateway(match last {
      Some(error) => error.to_string(),
      None => "no gateway urls configured".into(),
    }))
  }
}

impl Fetcher for Client {
  fn fetch(&self, request: &GatewayRequest) -> Result<GatewayResponse, ResolveError> {
    self.post("gateway", request)
  }

  fn dns_query(&self, name: &Name) -> Result<Vec<u8>, ResolveError> {
    let proof: DnsProof = self.post(
      "dns",
      &DnsQuery {
        name: &name.to_string(),
      },
    )?;
    hex::decode(proof.proof.trim_start_matches("0x"))
      .map_err(|error| ResolveError::Gateway(error.to_string()))
  }
}
