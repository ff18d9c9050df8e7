//! Invoice PDF rendering.
//!
//! Fixed A4 layout computed from the constants below. No business logic
//! lives here: totals are printed exactly as the builder computed them, and
//! every line item is drawn once, in order, with two-decimal amounts.

use std::io::BufWriter;

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rgb,
};

use crate::error::{BillingError, Result};
use crate::models::{Invoice, InvoiceItem};
use crate::money::Money;

// Page geometry (millimetres, origin bottom-left).
const PAGE_W: f64 = 210.0;
const PAGE_H: f64 = 297.0;
const MARGIN: f64 = 18.0;
const RIGHT_EDGE: f64 = PAGE_W - MARGIN;

// Table columns: item name is left-aligned, numeric columns right-aligned.
const COL_NAME_X: f64 = MARGIN + 2.0;
const COL_QTY_R: f64 = 132.0;
const COL_UNIT_R: f64 = 163.0;
const COL_AMOUNT_R: f64 = RIGHT_EDGE;
const ROW_H: f64 = 7.0;
const TABLE_TOP_FIRST: f64 = 209.0;
const TABLE_TOP_CONT: f64 = PAGE_H - 30.0;
const TABLE_BOTTOM: f64 = 40.0;

const SIZE_TITLE: f64 = 16.0;
const SIZE_HEAD: f64 = 10.0;
const SIZE_BODY: f64 = 9.0;
const SIZE_SMALL: f64 = 7.5;

// Approximate Helvetica advance width at SIZE_BODY, for right alignment of
// numeric cells; built-in fonts carry no metrics we can query.
const CHAR_W_BODY: f64 = 1.72;

/// Characters that fit the name column before truncation.
const NAME_MAX_CHARS: usize = 46;

const COMPANY_NAME: &str = "Oakline Furniture";
const COMPANY_ADDRESS: &str = "Verkstadsgatan 4, 211 35 Malmo, Sweden";
const COMPANY_EMAIL: &str = "billing@oakline.example";

/// Render an invoice and its frozen items to PDF bytes.
pub fn render_invoice(invoice: &Invoice, items: &[InvoiceItem]) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        format!("Invoice {}", invoice.invoice_number),
        Mm(PAGE_W),
        Mm(PAGE_H),
        "invoice",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| BillingError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| BillingError::Pdf(e.to_string()))?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);

    draw_header(&layer, &bold, &regular, invoice);
    draw_customer_block(&layer, &bold, &regular, invoice);
    draw_footer(&layer, &regular);

    let mut y = TABLE_TOP_FIRST;
    draw_table_head(&layer, &bold, y);
    y -= ROW_H;

    for (idx, item) in items.iter().enumerate() {
        if y < TABLE_BOTTOM {
            let (page, page_layer) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "invoice");
            layer = doc.get_page(page).get_layer(page_layer);
            draw_footer(&layer, &regular);
            y = TABLE_TOP_CONT;
            draw_table_head(&layer, &bold, y);
            y -= ROW_H;
        }

        if idx % 2 == 1 {
            shade_row(&layer, y);
        }

        let unit = Money::new(item.unit_price_minor, invoice.currency.clone());
        let amount = Money::new(item.line_total_minor, invoice.currency.clone());
        text(&layer, &regular, SIZE_BODY, COL_NAME_X, y, &truncate_name(&item.name, NAME_MAX_CHARS));
        text_right(&layer, &regular, SIZE_BODY, COL_QTY_R, y, &item.quantity.to_string());
        text_right(&layer, &regular, SIZE_BODY, COL_UNIT_R, y, &unit.to_string());
        text_right(&layer, &regular, SIZE_BODY, COL_AMOUNT_R, y, &amount.to_string());
        y -= ROW_H;
    }

    if y < TABLE_BOTTOM {
        let (page, page_layer) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "invoice");
        layer = doc.get_page(page).get_layer(page_layer);
        draw_footer(&layer, &regular);
        y = TABLE_TOP_CONT;
    }
    draw_totals(&layer, &bold, &regular, invoice, y);

    let mut bytes = Vec::new();
    {
        let mut writer = BufWriter::new(&mut bytes);
        doc.save(&mut writer)
            .map_err(|e| BillingError::Pdf(e.to_string()))?;
    }
    Ok(bytes)
}

fn draw_header(
    layer: &PdfLayerReference,
    bold: &IndirectFontRef,
    regular: &IndirectFontRef,
    invoice: &Invoice,
) {
    text(layer, bold, SIZE_TITLE, MARGIN, 272.0, COMPANY_NAME);
    text(layer, regular, SIZE_SMALL, MARGIN, 266.0, COMPANY_ADDRESS);
    text(layer, regular, SIZE_SMALL, MARGIN, 262.0, COMPANY_EMAIL);

    text_right(layer, bold, SIZE_TITLE, RIGHT_EDGE, 272.0, "INVOICE");
    text_right(layer, regular, SIZE_BODY, RIGHT_EDGE, 266.0, &invoice.invoice_number);
    text_right(
        layer,
        regular,
        SIZE_BODY,
        RIGHT_EDGE,
        262.0,
        &invoice.created_at.format("%Y-%m-%d").to_string(),
    );
    text_right(
        layer,
        regular,
        SIZE_BODY,
        RIGHT_EDGE,
        258.0,
        &invoice.status.as_str().to_uppercase(),
    );

    hline(layer, MARGIN, RIGHT_EDGE, 252.0);
}

fn draw_customer_block(
    layer: &PdfLayerReference,
    bold: &IndirectFontRef,
    regular: &IndirectFontRef,
    invoice: &Invoice,
) {
    text(layer, bold, SIZE_HEAD, MARGIN, 243.0, "Billed to");
    text(layer, regular, SIZE_BODY, MARGIN, 237.0, &invoice.customer_name);
    text(layer, regular, SIZE_BODY, MARGIN, 232.0, &invoice.billing_address);
    text(layer, regular, SIZE_BODY, MARGIN, 227.0, &invoice.customer_email);
}

fn draw_table_head(layer: &PdfLayerReference, bold: &IndirectFontRef, y: f64) {
    text(layer, bold, SIZE_BODY, COL_NAME_X, y, "Item");
    text_right(layer, bold, SIZE_BODY, COL_QTY_R, y, "Qty");
    text_right(layer, bold, SIZE_BODY, COL_UNIT_R, y, "Unit price");
    text_right(layer, bold, SIZE_BODY, COL_AMOUNT_R, y, "Amount");
    hline(layer, MARGIN, RIGHT_EDGE, y - 2.0);
}

fn draw_totals(
    layer: &PdfLayerReference,
    bold: &IndirectFontRef,
    regular: &IndirectFontRef,
    invoice: &Invoice,
    table_y: f64,
) {
    let mut y = table_y - 2.0;
    hline(layer, 120.0, RIGHT_EDGE, y + 5.0);

    let rows = [
        ("Subtotal", invoice.subtotal()),
        ("VAT (20%)", invoice.tax()),
        ("Shipping", invoice.shipping()),
    ];
    for (label, amount) in rows {
        text_right(layer, regular, SIZE_BODY, COL_UNIT_R, y, label);
        text_right(layer, regular, SIZE_BODY, COL_AMOUNT_R, y, &amount.to_string());
        y -= ROW_H * 0.85;
    }
    text_right(layer, bold, SIZE_HEAD, COL_UNIT_R, y, "Total");
    text_right(layer, bold, SIZE_HEAD, COL_AMOUNT_R, y, &invoice.total().to_string());

    y -= ROW_H * 1.6;
    text(
        layer,
        regular,
        SIZE_SMALL,
        MARGIN,
        y,
        &format!("Payment method: {}", invoice.payment_method),
    );
}

fn draw_footer(layer: &PdfLayerReference, regular: &IndirectFontRef) {
    hline(layer, MARGIN, RIGHT_EDGE, 20.0);
    text(
        layer,
        regular,
        SIZE_SMALL,
        MARGIN,
        14.0,
        &format!("{} - {} - {}", COMPANY_NAME, COMPANY_ADDRESS, COMPANY_EMAIL),
    );
}

fn text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    size: f64,
    x: f64,
    y: f64,
    content: &str,
) {
    layer.use_text(content.to_string(), size, Mm(x), Mm(y), font);
}

/// Right-align by estimated glyph width; close enough for numeric cells.
fn text_right(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    size: f64,
    right_x: f64,
    y: f64,
    content: &str,
) {
    let width = content.chars().count() as f64 * CHAR_W_BODY * (size / SIZE_BODY);
    text(layer, font, size, right_x - width, y, content);
}

fn shade_row(layer: &PdfLayerReference, y: f64) {
    layer.set_fill_color(Color::Rgb(Rgb::new(0.94, 0.94, 0.94, None)));
    layer.add_shape(Line {
        points: vec![
            (Point::new(Mm(MARGIN), Mm(y - 2.0)), false),
            (Point::new(Mm(RIGHT_EDGE), Mm(y - 2.0)), false),
            (Point::new(Mm(RIGHT_EDGE), Mm(y + 4.5)), false),
            (Point::new(Mm(MARGIN), Mm(y + 4.5)), false),
        ],
        is_closed: true,
        has_fill: true,
        has_stroke: false,
        is_clipping_path: false,
    });
    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
}

fn hline(layer: &PdfLayerReference, x0: f64, x1: f64, y: f64) {
    layer.set_outline_color(Color::Rgb(Rgb::new(0.55, 0.55, 0.55, None)));
    layer.set_outline_thickness(0.3);
    layer.add_shape(Line {
        points: vec![
            (Point::new(Mm(x0), Mm(y)), false),
            (Point::new(Mm(x1), Mm(y)), false),
        ],
        is_closed: false,
        has_fill: false,
        has_stroke: true,
        is_clipping_path: false,
    });
}

fn truncate_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        name.to_string()
    } else {
        let kept: String = name.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
