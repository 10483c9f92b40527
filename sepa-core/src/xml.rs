//! ISO 20022 XML serializer
//!
//! Writes a completed [`Message`] as a `pain.008` or `pain.001` document:
//!
//! ```text
//! Document (xmlns)
//!   CstmrDrctDbtInitn | CstmrCdtTrfInitn
//!     PmtInf
//!       header party / account / agent
//!       one subtree per extension field, in stored order; consecutive
//!       fields under the same parent share that parent
//! ```
//!
//! Text and attribute values go through quick-xml's escaping, which covers
//! `&`, `<`, `>`, `"` and `'`. Output depends only on the message and the
//! [`XmlConfig`], so the same message always yields the same bytes.

use crate::config::XmlConfig;
use crate::message::Message;
use crate::schema::{self, FieldKind, SEPA_CURRENCY};
use crate::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;
use tracing::debug;

/// Serializer for completed messages
#[derive(Debug, Clone, Default)]
pub struct XmlSerializer {
    config: XmlConfig,
}

impl XmlSerializer {
    /// Create serializer with the given output settings
    pub fn new(config: XmlConfig) -> Self {
        Self { config }
    }

    /// Output settings
    pub fn config(&self) -> &XmlConfig {
        &self.config
    }

    /// First missing requirement: header fields, then schema fields in
    /// declaration order
    pub fn check_complete(&self, message: &Message) -> Result<()> {
        let headers = [
            ("name", message.name()),
            ("iban", message.iban()),
            ("bic", message.bic()),
        ];
        for (field, value) in headers {
            if value.map_or(true, str::is_empty) {
                return Err(Error::MissingField(field.to_string()));
            }
        }

        for key in schema::required_keys(message.message_type()) {
            if message.field(key).map_or(true, str::is_empty) {
                return Err(Error::MissingField(key.to_string()));
            }
        }
        Ok(())
    }

    /// Serialize a completed message
    pub fn serialize(&self, message: &Message) -> Result<String> {
        self.check_complete(message)?;

        let mut writer = if self.config.pretty_print {
            Writer::new_with_indent(Vec::new(), b' ', self.config.indent_width)
        } else {
            Writer::new(Vec::new())
        };

        if self.config.declaration {
            writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        }
        write_document(&mut writer, message)?;

        let xml = String::from_utf8(writer.into_inner())
            .map_err(|e| Error::Xml(format!("writer produced invalid UTF-8: {}", e)))?;

        debug!(
            message_type = %message.message_type(),
            fields = message.fields().len(),
            bytes = xml.len(),
            "Message serialized"
        );
        Ok(xml)
    }
}

fn write_document<W: Write>(writer: &mut Writer<W>, message: &Message) -> quick_xml::Result<()> {
    let message_type = message.message_type();
    let header = schema::header_elements(message_type);

    let mut root = BytesStart::new("Document");
    root.push_attribute(("xmlns", message_type.namespace()));
    writer.write_event(Event::Start(root))?;
    writer.write_event(Event::Start(BytesStart::new(message_type.document_element())))?;
    writer.write_event(Event::Start(BytesStart::new("PmtInf")))?;

    let mut open = OpenElements::default();
    let name = message.name().unwrap_or_default();
    let iban = message.iban().unwrap_or_default();
    let bic = message.bic().unwrap_or_default();
    open.write_leaf(writer, &[header.party, "Nm"], None, name)?;
    open.write_leaf(writer, &[header.account, "Id", "IBAN"], None, iban)?;
    open.write_leaf(writer, &[header.agent, "FinInstnId", "BIC"], None, bic)?;

    for (key, value) in message.fields() {
        // Stored keys were validated against this schema
        let Some(spec) = schema::lookup(message_type, key) else {
            continue;
        };
        let currency = match spec.kind {
            FieldKind::Amount => Some(("Ccy", SEPA_CURRENCY)),
            _ => None,
        };
        open.write_leaf(writer, spec.path, currency, value)?;
    }
    open.close_to(writer, 0)?;

    writer.write_event(Event::End(BytesEnd::new("PmtInf")))?;
    writer.write_event(Event::End(BytesEnd::new(message_type.document_element())))?;
    writer.write_event(Event::End(BytesEnd::new("Document")))?;
    Ok(())
}

/// Parent elements still open after the previous leaf
///
/// Consecutive leaves sharing a parent path are written into the same parent
/// elements, so `mandate_id` followed by `mandate_date` yields one
/// `DrctDbtTx/MndtRltdInf` block. Stored field order is never changed.
#[derive(Debug, Default)]
struct OpenElements {
    names: Vec<&'static str>,
}

impl OpenElements {
    fn write_leaf<W: Write>(
        &mut self,
        writer: &mut Writer<W>,
        path: &[&'static str],
        attribute: Option<(&str, &str)>,
        text: &str,
    ) -> quick_xml::Result<()> {
        let Some((leaf, parents)) = path.split_last() else {
            return Ok(());
        };

        let shared = self
            .names
            .iter()
            .zip(parents)
            .take_while(|(open, wanted)| open == wanted)
            .count();
        self.close_to(writer, shared)?;

        for name in &parents[shared..] {
            writer.write_event(Event::Start(BytesStart::new(*name)))?;
            self.names.push(*name);
        }

        let mut element = writer.create_element(*leaf);
        if let Some(attribute) = attribute {
            element = element.with_attribute(attribute);
        }
        element.write_text_content(BytesText::new(text))?;
        Ok(())
    }

    fn close_to<W: Write>(&mut self, writer: &mut Writer<W>, depth: usize) -> quick_xml::Result<()> {
        while self.names.len() > depth {
            if let Some(name) = self.names.pop() {
                writer.write_event(Event::End(BytesEnd::new(name)))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageType;
    use quick_xml::Reader;

    fn complete_ddi() -> Message {
        let mut msg = Message::new(MessageType::DirectDebitInitiation);
        msg.set_name("ACME Corp");
        msg.set_iban("DE89370400440532013000");
        msg.set_bic("COBADEFFXXX");
        msg.merge_fields(&[("mandate_id", "M-123")]);
        msg
    }

    /// Element names in document order, failing on malformed XML
    fn element_names(xml: &str) -> Vec<String> {
        let mut reader = Reader::from_str(xml);
        let mut names = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) => {
                    names.push(String::from_utf8(e.name().as_ref().to_vec()).unwrap())
                }
                Event::Eof => break,
                _ => {}
            }
        }
        names
    }

    #[test]
    fn test_missing_fields_in_fixed_order() {
        let serializer = XmlSerializer::default();
        let mut msg = Message::new(MessageType::DirectDebitInitiation);

        let missing = |msg: &Message| match serializer.serialize(msg) {
            Err(Error::MissingField(field)) => field,
            other => panic!("expected MissingField, got {:?}", other),
        };

        assert_eq!(missing(&msg), "name");
        msg.set_name("ACME Corp");
        assert_eq!(missing(&msg), "iban");
        msg.set_iban("DE89370400440532013000");
        assert_eq!(missing(&msg), "bic");
        msg.set_bic("COBADEFFXXX");
        assert_eq!(missing(&msg), "mandate_id");
        msg.merge_fields(&[("mandate_id", "M-123")]);
        assert!(serializer.serialize(&msg).is_ok());
    }

    #[test]
    fn test_direct_debit_document() {
        let xml = XmlSerializer::default().serialize(&complete_ddi()).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<Document xmlns=\"urn:iso:std:iso:20022:tech:xsd:pain.008.001.02\">"));
        assert!(xml.contains("<Nm>ACME Corp</Nm>"));
        assert!(xml.contains("<IBAN>DE89370400440532013000</IBAN>"));
        assert!(xml.contains("<BIC>COBADEFFXXX</BIC>"));
        assert!(xml.contains("<MndtId>M-123</MndtId>"));
        assert_eq!(
            element_names(&xml),
            vec![
                "Document",
                "CstmrDrctDbtInitn",
                "PmtInf",
                "Cdtr",
                "Nm",
                "CdtrAcct",
                "Id",
                "IBAN",
                "CdtrAgt",
                "FinInstnId",
                "BIC",
                "DrctDbtTx",
                "MndtRltdInf",
                "MndtId",
            ]
        );
    }

    #[test]
    fn test_credit_transfer_uses_debtor_header() {
        let mut msg = Message::new(MessageType::CreditTransferInitiation);
        msg.set_name("ACME Corp");
        msg.set_iban("DE89370400440532013000");
        msg.set_bic("COBADEFFXXX");
        msg.merge_fields(&[("end_to_end_id", "E2E-1"), ("amount", "99.95")]);

        let xml = XmlSerializer::default().serialize(&msg).unwrap();
        let names = element_names(&xml);
        assert_eq!(names[1], "CstmrCdtTrfInitn");
        assert_eq!(names[3], "Dbtr");
        assert!(xml.contains("<InstdAmt Ccy=\"EUR\">99.95</InstdAmt>"));
    }

    #[test]
    fn test_fields_written_in_stored_order() {
        let mut msg = complete_ddi();
        msg.merge_fields(&[("remittance_info", "Invoice 42"), ("amount", "10.00")]);

        let xml = XmlSerializer::default().serialize(&msg).unwrap();
        let mandate = xml.find("<MndtId>").unwrap();
        let remittance = xml.find("<Ustrd>").unwrap();
        let amount = xml.find("<InstdAmt").unwrap();
        assert!(mandate < remittance && remittance < amount);
    }

    #[test]
    fn test_consecutive_fields_share_parent() {
        let mut msg = complete_ddi();
        msg.merge_fields(&[("mandate_date", "2024-01-15"), ("amount", "10.00")]);

        let xml = XmlSerializer::default().serialize(&msg).unwrap();
        assert_eq!(xml.matches("<DrctDbtTx>").count(), 1);
        assert_eq!(xml.matches("<MndtRltdInf>").count(), 1);
        assert_eq!(
            &element_names(&xml)[11..],
            &["DrctDbtTx", "MndtRltdInf", "MndtId", "DtOfSgntr", "InstdAmt"]
        );
    }

    #[test]
    fn test_non_adjacent_fields_keep_stored_order() {
        let mut msg = complete_ddi();
        msg.merge_fields(&[("amount", "10.00"), ("mandate_date", "2024-01-15")]);

        let xml = XmlSerializer::default().serialize(&msg).unwrap();
        assert_eq!(xml.matches("<DrctDbtTx>").count(), 2);
        assert!(xml.find("<InstdAmt").unwrap() < xml.find("<DtOfSgntr>").unwrap());
    }

    #[test]
    fn test_parent_closed_before_next_branch() {
        let mut msg = Message::new(MessageType::CreditTransferInitiation);
        msg.set_name("ACME Corp");
        msg.set_iban("DE89370400440532013000");
        msg.set_bic("COBADEFFXXX");
        msg.merge_fields(&[
            ("end_to_end_id", "E2E-1"),
            ("instruction_id", "INSTR-1"),
            ("execution_date", "2024-03-01"),
            ("purpose_code", "SALA"),
        ]);

        let xml = XmlSerializer::default().serialize(&msg).unwrap();
        assert_eq!(xml.matches("<PmtId>").count(), 1);
        assert!(xml.find("<InstrId>").unwrap() < xml.find("</PmtId>").unwrap());
        assert!(xml.find("</PmtId>").unwrap() < xml.find("<ReqdExctnDt>").unwrap());
    }

    #[test]
    fn test_text_is_escaped() {
        let mut msg = complete_ddi();
        msg.set_name("Smith & Sons <\"Ltd\"> O'Neil");

        let xml = XmlSerializer::default().serialize(&msg).unwrap();
        assert!(xml.contains("<Nm>Smith &amp; Sons &lt;&quot;Ltd&quot;&gt; O&apos;Neil</Nm>"));
        element_names(&xml);
    }

    #[test]
    fn test_compact_output() {
        let serializer = XmlSerializer::new(XmlConfig {
            pretty_print: false,
            indent_width: 2,
            declaration: false,
        });
        let xml = serializer.serialize(&complete_ddi()).unwrap();
        assert!(xml.starts_with("<Document"));
        assert!(!xml.contains('\n'));
    }

    #[test]
    fn test_deterministic() {
        let serializer = XmlSerializer::default();
        let msg = complete_ddi();
        assert_eq!(serializer.serialize(&msg).unwrap(), serializer.serialize(&msg).unwrap());
    }
}
