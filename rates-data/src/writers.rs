//! Output writers for the price list.
//!
//! Writers only ever copy [`ExportValue`] text (or, for spreadsheet cells,
//! its already-rounded amount). None of them formats or rounds a number.

use std::io::Write;
use std::path::Path;

use rates_core::export::{
    ADMIN_HEADERS, AdminRecord, RECORD_HEADERS, TRANSPORT_HEADERS, TransportRecord,
};
use rates_core::{ExportRecord, ExportValue};
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet, XlsxError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportWriteError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON write error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Excel write error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The JSON price list: customer header plus line and transport records.
#[derive(Debug, Serialize)]
pub struct PriceListDocument<'a> {
    pub customer_name: &'a str,
    pub date_created: String,
    pub items: &'a [ExportRecord],
    pub transport_charges: &'a [TransportRecord],
}

fn write_rows<'a, W, I>(
    writer: W,
    headers: &[&str],
    rows: I,
) -> Result<(), ExportWriteError>
where
    W: Write,
    I: IntoIterator<Item = Vec<&'a str>>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(headers)?;
    for row in rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_csv<W: Write>(
    writer: W,
    records: &[ExportRecord],
) -> Result<(), ExportWriteError> {
    write_rows(writer, &RECORD_HEADERS, records.iter().map(|r| r.fields().to_vec()))
}

pub fn write_admin_csv<W: Write>(
    writer: W,
    records: &[AdminRecord],
) -> Result<(), ExportWriteError> {
    write_rows(writer, &ADMIN_HEADERS, records.iter().map(|r| r.fields().to_vec()))
}

pub fn write_transport_csv<W: Write>(
    writer: W,
    records: &[TransportRecord],
) -> Result<(), ExportWriteError> {
    write_rows(writer, &TRANSPORT_HEADERS, records.iter().map(|r| r.fields().to_vec()))
}

pub fn write_json<W: Write>(
    writer: W,
    document: &PriceListDocument<'_>,
) -> Result<(), ExportWriteError> {
    serde_json::to_writer_pretty(writer, document)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Excel
// ---------------------------------------------------------------------------

const PRICE_COLUMNS: [usize; 3] = [2, 3, 4];

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color(rust_xlsxwriter::Color::RGB(0x1F4E79))
        .set_font_color(rust_xlsxwriter::Color::RGB(0xFFFFFF))
}

/// Numeric values become number cells showing two decimals; POA and other
/// text stay text.
fn write_value_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &ExportValue,
    number_format: &Format,
    text_format: &Format,
) -> Result<(), XlsxError> {
    match value.amount.and_then(|amount| amount.to_f64()) {
        Some(number) => worksheet
            .write_number_with_format(row, col, number, number_format)
            .map(|_| ()),
        None => worksheet
            .write_string_with_format(row, col, &value.text, text_format)
            .map(|_| ()),
    }
}

fn write_header_row(
    worksheet: &mut Worksheet,
    headers: &[&str],
) -> Result<(), XlsxError> {
    let format = header_format();
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &format)?;
    }
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

/// Builds the price-list workbook: a "Price List" sheet and, when there are
/// transport records, a "Transport" sheet.
pub fn build_workbook(
    records: &[ExportRecord],
    transport: &[TransportRecord],
) -> Result<Workbook, ExportWriteError> {
    let number_format = Format::new()
        .set_num_format("0.00")
        .set_align(FormatAlign::Right);
    let text_format = Format::new();

    let mut workbook = Workbook::new();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Price List")?;
    write_header_row(worksheet, &RECORD_HEADERS)?;
    for (idx, record) in records.iter().enumerate() {
        let row = (idx + 1) as u32;
        let values = [
            &record.original_price,
            &record.net_price,
            &record.discount_percent,
        ];
        for (col, text) in record.fields().iter().enumerate() {
            match PRICE_COLUMNS.iter().position(|c| *c == col) {
                Some(slot) => write_value_cell(
                    worksheet,
                    row,
                    col as u16,
                    values[slot],
                    &number_format,
                    &text_format,
                )?,
                None => {
                    worksheet.write_string_with_format(row, col as u16, *text, &text_format)?;
                }
            }
        }
    }

    if !transport.is_empty() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Transport")?;
        write_header_row(worksheet, &TRANSPORT_HEADERS)?;
        for (idx, record) in transport.iter().enumerate() {
            let row = (idx + 1) as u32;
            worksheet.write_string_with_format(row, 0, &record.transport_type, &text_format)?;
            write_value_cell(worksheet, row, 1, &record.charge, &number_format, &text_format)?;
        }
    }

    Ok(workbook)
}

pub fn write_xlsx(
    path: &Path,
    records: &[ExportRecord],
    transport: &[TransportRecord],
) -> Result<(), ExportWriteError> {
    let mut workbook = build_workbook(records, transport)?;
    workbook.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rates_core::{
        Catalog, EditingSession, ExportFormatter, GroupKey, PriceValue, ResolvedLineItem,
    };
    use rust_decimal_macros::dec;

    use super::*;

    fn resolved() -> Vec<ResolvedLineItem> {
        let catalog = Catalog::from_rows(vec![
            rates_core::CatalogItem {
                item_key: "A1".to_string(),
                name: "Tower 5m".to_string(),
                base_rate: PriceValue::Numeric(dec!(85)),
                group: "Access".to_string(),
                sub_section: "Towers".to_string(),
                max_discount_percent: dec!(30),
                include: true,
                order: dec!(1),
            },
            rates_core::CatalogItem {
                item_key: "P1".to_string(),
                name: "Excavator, 1.5t".to_string(),
                base_rate: PriceValue::Poa,
                group: "Plant".to_string(),
                sub_section: "Excavators".to_string(),
                max_discount_percent: dec!(10),
                include: true,
                order: dec!(1),
            },
        ]);
        let mut session = EditingSession::default();
        session
            .set_group_discount(GroupKey::new("Access", "Towers"), dec!(15))
            .unwrap();
        session.resolve(&catalog)
    }

    #[test]
    fn csv_has_header_and_canonical_text() {
        let records = ExportFormatter::to_records(&resolved());
        let mut out = Vec::new();

        write_csv(&mut out, &records).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "ItemCategory,EquipmentName,OriginalPrice,NetPrice,DiscountPercent,Group,SubSection\n\
             A1,Tower 5m,85.00,72.25,15.00,Access,Towers\n\
             P1,\"Excavator, 1.5t\",POA,POA,POA,Plant,Excavators\n"
        );
    }

    #[test]
    fn admin_csv_leads_with_customer() {
        let created = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let records = ExportFormatter::to_admin_records(&resolved(), "Acme", created);
        let mut out = Vec::new();

        write_admin_csv(&mut out, &records).unwrap();

        let text = String::from_utf8(out).unwrap();
        let second_line = text.lines().nth(1).unwrap();
        assert_eq!(
            second_line,
            "Acme,2025-03-01 08:00,A1,Tower 5m,85.00,72.25,15.00,Access,Towers"
        );
    }

    #[test]
    fn json_and_csv_agree_on_every_price() {
        let records = ExportFormatter::to_records(&resolved());
        let document = PriceListDocument {
            customer_name: "Acme",
            date_created: "2025-03-01 08:00".to_string(),
            items: &records,
            transport_charges: &[],
        };
        let mut out = Vec::new();

        write_json(&mut out, &document).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["items"][0]["NetPrice"], "72.25");
        assert_eq!(value["items"][0]["DiscountPercent"], "15.00");
        assert_eq!(value["items"][1]["OriginalPrice"], "POA");
        assert_eq!(value["customer_name"], "Acme");
    }

    #[test]
    fn transport_csv_keeps_words() {
        let session = EditingSession::default();
        let records = ExportFormatter::to_transport_records(&session.transport_rows());
        let mut out = Vec::new();

        write_transport_csv(&mut out, &records).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Delivery or Collection type,Charge (£)\n"));
        assert!(text.contains("Powered Access,Negotiable\n"));
        assert!(text.contains("Towables,7.50\n"));
    }

    #[test]
    fn workbook_serializes_to_xlsx_bytes() {
        let records = ExportFormatter::to_records(&resolved());
        let session = EditingSession::default();
        let transport = ExportFormatter::to_transport_records(&session.transport_rows());

        let mut workbook = build_workbook(&records, &transport).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        // XLSX files are zip archives.
        assert_eq!(&bytes[..2], b"PK");
    }
}
