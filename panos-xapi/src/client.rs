use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::Client as HttpClient;

use crate::element::Element;
use crate::parser::parse;
use crate::response::{ApiError, ApiResponse};
use crate::writer::write;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const JOB_POLL_INTERVAL: Duration = Duration::from_secs(2);
const JOB_POLL_CEILING: Duration = Duration::from_secs(600);

/// A keygen-authenticated session against one device's XML API.
///
/// All methods are blocking and issue exactly one HTTPS request (commit
/// additionally polls its job). There is no retry: a transport or device
/// error is returned to the caller as-is.
pub struct Client {
    http: HttpClient,
    host: String,
    key: String,
}

/// What a commit call amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The candidate configuration had no changes to commit.
    NoChanges,
    /// The commit job finished with result OK.
    Committed { job: String },
}

impl Client {
    /// Authenticate against `host` with a `type=keygen` request.
    ///
    /// `accept_invalid_certs` disables TLS verification; management-plane
    /// certificates are self-signed on most deployments.
    pub fn connect(
        host: &str,
        username: &str,
        password: &str,
        accept_invalid_certs: bool,
    ) -> Result<Self, ApiError> {
        let http = HttpClient::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let mut client = Self {
            http,
            host: host.to_string(),
            key: String::new(),
        };

        let response =
            client.call(&[("type", "keygen"), ("user", username), ("password", password)])?;
        let key = response
            .result()
            .and_then(|result| result.trimmed_text_at(&["key"]))
            .ok_or_else(|| ApiError::Envelope("keygen response carried no key".to_string()))?;
        client.key = key.to_string();

        Ok(client)
    }

    /// Hostname this session is bound to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Read a candidate-configuration node. `None` when the xpath matches
    /// nothing (the API answers success with an empty result).
    pub fn get_config(&self, xpath: &str) -> Result<Option<Element>, ApiError> {
        let response = self.call(&[("type", "config"), ("action", "get"), ("xpath", xpath)])?;
        Ok(response.into_result())
    }

    /// Merge elements into the candidate configuration under `xpath`.
    ///
    /// The elements are serialized back-to-back into one `element=`
    /// parameter, so a whole batch of `<entry>` nodes lands in a single
    /// API call.
    pub fn set_config(&self, xpath: &str, elements: &[Element]) -> Result<(), ApiError> {
        let payload = elements
            .iter()
            .map(write)
            .collect::<Result<Vec<_>, _>>()?
            .concat();
        self.call(&[
            ("type", "config"),
            ("action", "set"),
            ("xpath", xpath),
            ("element", &payload),
        ])?;
        Ok(())
    }

    /// Run an operational command. `None` when the command has no result
    /// payload.
    pub fn op(&self, cmd: &Element) -> Result<Option<Element>, ApiError> {
        let payload = write(cmd)?;
        let response = self.call(&[("type", "op"), ("cmd", &payload)])?;
        Ok(response.into_result())
    }

    /// Commit the candidate configuration and wait for the job to finish.
    pub fn commit(&self, description: &str) -> Result<CommitOutcome, ApiError> {
        let cmd = Element::new("commit").with_text_child("description", description);
        let payload = write(&cmd)?;
        let response = self.call(&[("type", "commit"), ("cmd", &payload)])?;

        // An up-to-date candidate answers success without a job id.
        let Some(job) = response
            .result()
            .and_then(|result| result.trimmed_text_at(&["job"]))
            .map(str::to_string)
        else {
            return Ok(CommitOutcome::NoChanges);
        };

        self.wait_for_job(&job)
    }

    fn wait_for_job(&self, job: &str) -> Result<CommitOutcome, ApiError> {
        let started = Instant::now();
        loop {
            let cmd = Element::new("show").with_child(
                Element::new("jobs").with_child(Element::new("id").with_text(job)),
            );
            let result = self.op(&cmd)?.ok_or_else(|| {
                ApiError::Envelope(format!("job {job} query returned no result"))
            })?;
            let job_node = result.child("job").ok_or_else(|| {
                ApiError::Envelope(format!("job {job} query returned no job node"))
            })?;

            if job_node.trimmed_text_at(&["status"]) == Some("FIN") {
                if job_node.trimmed_text_at(&["result"]) == Some("OK") {
                    return Ok(CommitOutcome::Committed {
                        job: job.to_string(),
                    });
                }
                return Err(ApiError::CommitFailed {
                    job: job.to_string(),
                    details: job_details(job_node),
                });
            }

            if started.elapsed() >= JOB_POLL_CEILING {
                return Err(ApiError::CommitTimeout {
                    job: job.to_string(),
                    waited_secs: started.elapsed().as_secs(),
                });
            }
            thread::sleep(JOB_POLL_INTERVAL);
        }
    }

    fn call(&self, params: &[(&str, &str)]) -> Result<ApiResponse, ApiError> {
        let url = format!("https://{}/api/", self.host);
        let mut form: Vec<(&str, &str)> = params.to_vec();
        if !self.key.is_empty() {
            form.push(("key", self.key.as_str()));
        }

        let body = self
            .http
            .post(&url)
            .form(&form)
            .send()?
            .error_for_status()?
            .bytes()?;
        ApiResponse::from_root(parse(&body)?)
    }
}

/// Failure details from a finished job, wherever the device put them.
fn job_details(job_node: &Element) -> String {
    let lines: Vec<String> = job_node
        .child("details")
        .map(|details| {
            details
                .children_named("line")
                .filter_map(|line| line.text.as_deref())
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if lines.is_empty() {
        "(no details)".to_string()
    } else {
        lines.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::job_details;
    use crate::parser::parse;

    #[test]
    fn job_details_joins_lines() {
        let result = parse(
            br#"<result><job><status>FIN</status><result>FAIL</result><details><line>validation error</line><line>rule 'allow-web' is invalid</line></details></job></result>"#,
        )
        .expect("parse");
        let job = result.child("job").expect("job node");

        assert_eq!(
            job_details(job),
            "validation error; rule 'allow-web' is invalid"
        );
    }

    #[test]
    fn job_details_tolerates_missing_details() {
        let result =
            parse(br#"<result><job><status>FIN</status><result>FAIL</result></job></result>"#)
                .expect("parse");
        let job = result.child("job").expect("job node");

        assert_eq!(job_details(job), "(no details)");
    }
}
