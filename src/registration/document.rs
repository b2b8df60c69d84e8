// Transaction document sent to the inventory system's CreateTickets operation

use chrono::NaiveDate;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use rust_decimal::Decimal;
use std::io::Cursor;

use crate::certificates::PriceCalculator;

/// Amounts per tender GUID, kept in the order each GUID was first seen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenderLedger {
    entries: Vec<(String, Decimal)>,
}

impl TenderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, guid: &str, amount: Decimal) {
        match self.entries.iter_mut().find(|(existing, _)| existing == guid) {
            Some((_, total)) => *total += amount,
            None => self.entries.push((guid.to_string(), amount)),
        }
    }

    pub fn entries(&self) -> &[(String, Decimal)] {
        &self.entries
    }

    pub fn total_for(&self, guid: &str) -> Option<Decimal> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == guid)
            .map(|(_, total)| *total)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchHeader {
    pub batch_id: i32,
    pub batch_date: NaiveDate,
    pub department_number: String,
    pub employee_number: String,
    pub member_number: String,
}

/// One certificate line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub inventory_item_id: String,
    pub price: Decimal,
    pub purchaser: String,
    pub receiver: String,
    pub certificate_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDocument {
    pub header: BatchHeader,
    pub items: Vec<BatchItem>,
    pub tenders: TenderLedger,
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn open(writer: &mut XmlWriter, name: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))
}

fn close(writer: &mut XmlWriter, name: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))
}

fn element(writer: &mut XmlWriter, name: &str, value: &str) -> quick_xml::Result<()> {
    open(writer, name)?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    close(writer, name)
}

fn amount(value: Decimal) -> String {
    format!("{:.2}", PriceCalculator::round(value))
}

impl BatchDocument {
    pub fn to_xml(&self) -> quick_xml::Result<String> {
        let header = &self.header;
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        let w = &mut writer;

        open(w, "Root")?;
        open(w, "Details")?;
        element(w, "BatchName", &format!("Certificate Batch {}", header.batch_id))?;
        element(w, "BatchDate", &header.batch_date.format("%-m/%-d/%Y").to_string())?;
        element(w, "DeptNumber", &header.department_number)?;

        open(w, "BatchDetails")?;
        element(w, "EmplNumber", &header.employee_number)?;
        element(w, "MemberNumber", &header.member_number)?;
        element(w, "MemberExtension", "000")?;
        element(
            w,
            "TranID",
            &format!("Certificate Batch Transaction: {}", header.batch_id),
        )?;

        for item in &self.items {
            open(w, "Items")?;
            element(w, "uidInvItemID", &item.inventory_item_id)?;
            element(w, "Price", &amount(item.price))?;
            element(w, "Quantity", "1")?;
            element(w, "Purchaser", &item.purchaser)?;
            element(w, "Receiver", &item.receiver)?;
            element(w, "CertificateNumber", &item.certificate_number)?;
            close(w, "Items")?;
        }

        for (guid, total) in self.tenders.entries() {
            open(w, "Tenders")?;
            element(w, "uidTenderID", guid)?;
            element(w, "TenderAmount", &amount(*total))?;
            close(w, "Tenders")?;
        }

        close(w, "BatchDetails")?;
        close(w, "Details")?;
        close(w, "Root")?;

        String::from_utf8(writer.into_inner().into_inner())
            .map_err(|e| quick_xml::Error::NonDecodable(Some(e.utf8_error())))
    }
}
