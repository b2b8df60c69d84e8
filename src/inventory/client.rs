use async_trait::async_trait;
use mockall::automock;
use quick_xml::escape::escape;
use uuid::Uuid;

use crate::config::InventoryConfig;
use crate::inventory::{CreateTicketResponse, InventoryError, TenderMethod};
use crate::xml::{self, XmlNode};

/// Operations the issuance workflow needs from the point-of-sale inventory system
#[automock]
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Confirm the service is reachable and the credentials are accepted
    async fn ping(&self) -> Result<bool, InventoryError>;

    /// Tender methods configured for a department
    async fn get_tender_methods_for_department(
        &self,
        department_id: Uuid,
    ) -> Result<Vec<TenderMethod>, InventoryError>;

    /// Submit a priced transaction document
    async fn create_ticket(&self, batch_xml: &str) -> Result<CreateTicketResponse, InventoryError>;
}

const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// SOAP client for the IBS web member API
#[derive(Clone)]
pub struct SoapInventoryClient {
    http: reqwest::Client,
    config: InventoryConfig,
}

impl SoapInventoryClient {
    pub fn new(config: InventoryConfig) -> Result<Self, InventoryError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Wrap an operation and its parameters in a SOAP 1.1 envelope
    fn envelope(&self, operation: &str, params: &[(&str, &str)]) -> String {
        let mut body = format!(
            "<a_sUser>{}</a_sUser><a_sPassword>{}</a_sPassword>",
            escape(&self.config.user),
            escape(&self.config.password)
        );
        for (name, value) in params {
            body.push_str(&format!("<{name}>{}</{name}>", escape(*value), name = name));
        }

        format!(
            concat!(
                r#"<?xml version="1.0" encoding="utf-8"?>"#,
                r#"<soap:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
                r#"xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:soap="{envelope_ns}">"#,
                r#"<soap:Body><{operation} xmlns="{ns}">{body}</{operation}></soap:Body>"#,
                r#"</soap:Envelope>"#
            ),
            envelope_ns = SOAP_ENVELOPE_NS,
            operation = operation,
            ns = self.config.namespace,
            body = body
        )
    }

    /// Call an operation and return its `{operation}Response` element
    async fn call(&self, operation: &str, params: &[(&str, &str)]) -> Result<XmlNode, InventoryError> {
        tracing::debug!("IBS: {}", operation);

        let response = self
            .http
            .post(&self.config.endpoint)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{}{}\"", self.config.namespace, operation))
            .body(self.envelope(operation, params))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_response(operation, status.as_u16(), &body)
    }
}

/// Extract the operation response, turning faults and HTTP errors into errors
fn parse_response(operation: &str, status: u16, body: &str) -> Result<XmlNode, InventoryError> {
    let document = match xml::parse(body) {
        Ok(document) => document,
        Err(_) if !(200..300).contains(&status) => {
            return Err(InventoryError::Status {
                status,
                body: body.chars().take(200).collect(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(fault) = document.find("Fault") {
        return Err(InventoryError::Fault(fault.child_text("faultstring").to_string()));
    }

    if !(200..300).contains(&status) {
        return Err(InventoryError::Status {
            status,
            body: body.chars().take(200).collect(),
        });
    }

    let response_name = format!("{}Response", operation);
    document
        .find(&response_name)
        .cloned()
        .ok_or_else(|| InventoryError::Protocol(format!("missing <{}>", response_name)))
}

fn parse_bool(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true") || value.trim() == "1"
}

fn parse_tender_methods(response: &XmlNode) -> Vec<TenderMethod> {
    let result = match response.find("GetTenderAllTenderMethodsForDepartmentResult") {
        Some(result) => result,
        None => return Vec::new(),
    };

    result
        .children_named("TenderData")
        .map(|tender| TenderMethod {
            name: tender.child_text("Name").to_string(),
            guid: tender.child_text("guid").to_string(),
            procedure: tender.child_text("Procedure").to_string(),
        })
        .collect()
}

fn parse_create_ticket(response: &XmlNode) -> Result<CreateTicketResponse, InventoryError> {
    let result = response
        .find("CreateTicketsResult")
        .ok_or_else(|| InventoryError::Protocol("missing <CreateTicketsResult>".to_string()))?;

    let message = response
        .find("a_sMessage")
        .map(|message| message.text.clone())
        .filter(|message| !message.trim().is_empty());

    Ok(CreateTicketResponse {
        result: parse_bool(&result.text),
        message,
    })
}

#[async_trait]
impl InventoryClient for SoapInventoryClient {
    async fn ping(&self) -> Result<bool, InventoryError> {
        let response = self.call("AreYouThere", &[]).await?;
        Ok(response
            .find("AreYouThereResult")
            .map(|result| parse_bool(&result.text))
            .unwrap_or(false))
    }

    async fn get_tender_methods_for_department(
        &self,
        department_id: Uuid,
    ) -> Result<Vec<TenderMethod>, InventoryError> {
        let department = department_id.to_string();
        let response = self
            .call(
                "GetTenderAllTenderMethodsForDepartment",
                &[("a_sDepartmentID", department.as_str())],
            )
            .await?;
        Ok(parse_tender_methods(&response))
    }

    async fn create_ticket(&self, batch_xml: &str) -> Result<CreateTicketResponse, InventoryError> {
        tracing::info!("IBS: Create ticket");
        let response = self.call("CreateTickets", &[("a_sXml", batch_xml)]).await?;
        parse_create_ticket(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn client() -> SoapInventoryClient {
        SoapInventoryClient::new(AppConfig::for_tests().inventory).unwrap()
    }

    #[test]
    fn test_envelope_escapes_parameters() {
        let envelope = client().envelope("CreateTickets", &[("a_sXml", "<Root>&</Root>")]);
        assert!(envelope.contains(r#"<CreateTickets xmlns="http://ibsinc.com/">"#));
        assert!(envelope.contains("<a_sUser>user</a_sUser>"));
        assert!(envelope.contains("<a_sXml>&lt;Root&gt;&amp;&lt;/Root&gt;</a_sXml>"));
    }

    #[test]
    fn test_parse_tender_methods() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
            <soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
              <soap:Body>
                <GetTenderAllTenderMethodsForDepartmentResponse xmlns="http://ibsinc.com/">
                  <GetTenderAllTenderMethodsForDepartmentResult>
                    <TenderData><Name>Comp Round Certificate Activation</Name><guid>g-comp</guid><Procedure>Comp</Procedure></TenderData>
                    <TenderData><Name>Member Charge</Name><guid>g-member</guid><Procedure>Member</Procedure></TenderData>
                  </GetTenderAllTenderMethodsForDepartmentResult>
                </GetTenderAllTenderMethodsForDepartmentResponse>
              </soap:Body>
            </soap:Envelope>"#;

        let response = parse_response("GetTenderAllTenderMethodsForDepartment", 200, body).unwrap();
        let tenders = parse_tender_methods(&response);
        assert_eq!(tenders.len(), 2);
        assert_eq!(tenders[1].guid, "g-member");
        assert_eq!(tenders[1].procedure, "Member");
    }

    #[test]
    fn test_parse_create_ticket_failure_keeps_embedded_message() {
        let body = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
              <soap:Body>
                <CreateTicketsResponse xmlns="http://ibsinc.com/">
                  <CreateTicketsResult>false</CreateTicketsResult>
                  <a_sMessage>&lt;Errors&gt;&lt;Error&gt;&lt;ErrorMessage&gt;Bad member&lt;/ErrorMessage&gt;&lt;/Error&gt;&lt;/Errors&gt;</a_sMessage>
                </CreateTicketsResponse>
              </soap:Body>
            </soap:Envelope>"#;

        let response = parse_response("CreateTickets", 200, body).unwrap();
        let ticket = parse_create_ticket(&response).unwrap();
        assert!(!ticket.result);
        assert_eq!(
            ticket.message.as_deref(),
            Some("<Errors><Error><ErrorMessage>Bad member</ErrorMessage></Error></Errors>")
        );
    }

    #[test]
    fn test_soap_fault_is_an_error() {
        let body = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
              <soap:Body><soap:Fault><faultcode>soap:Server</faultcode><faultstring>Login failed</faultstring></soap:Fault></soap:Body>
            </soap:Envelope>"#;

        let result = parse_response("CreateTickets", 500, body);
        assert!(matches!(result, Err(InventoryError::Fault(message)) if message == "Login failed"));
    }

    #[test]
    fn test_http_error_without_xml() {
        let result = parse_response("AreYouThere", 503, "Service Unavailable");
        assert!(matches!(result, Err(InventoryError::Status { status: 503, .. })));
    }
}
