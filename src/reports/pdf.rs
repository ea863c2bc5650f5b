//! PDF export of a [`ReportSet`].
//!
//! Layout and rendering are separate: [`layout`] walks the sections and places
//! every line at an explicit vertical offset on a page, [`render`] only paints
//! what was placed. Page breaks happen in [`Layout`] when the next block would
//! cross the bottom margin.

use super::{Panel, ReportSet};
use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use rust_decimal::Decimal;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 15.0;
const MARGIN_TOP: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 20.0;

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 13.0;
const TEXT_SIZE: f32 = 10.0;

const TITLE_HEIGHT: f32 = 10.0;
const HEADING_HEIGHT: f32 = 9.0;
const ROW_HEIGHT: f32 = 6.0;
const SECTION_GAP: f32 = 4.0;

/// Column offsets of a three column table.
const COLUMNS: [f32; 3] = [MARGIN_LEFT, 120.0, 160.0];
const MAX_LABEL_CHARS: usize = 48;

#[derive(Debug, Clone, PartialEq)]
pub struct Placed {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub bold: bool,
}

/// Text placed on pages, top to bottom. `y` is measured from the page bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pages: Vec<Vec<Placed>>,
    cursor: f32,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new()
    }
}

impl Layout {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            cursor: PAGE_HEIGHT - MARGIN_TOP,
        }
    }

    #[must_use]
    pub fn pages(&self) -> &[Vec<Placed>] {
        &self.pages
    }

    /// Start a new page unless `height` still fits above the bottom margin.
    fn reserve(&mut self, height: f32) {
        if self.cursor - height < MARGIN_BOTTOM {
            self.pages.push(Vec::new());
            self.cursor = PAGE_HEIGHT - MARGIN_TOP;
        }
    }

    fn place(&mut self, cells: &[(f32, String)], size: f32, bold: bool, height: f32) {
        self.reserve(height);
        let y = self.cursor - height;
        if let Some(page) = self.pages.last_mut() {
            page.extend(cells.iter().map(|(x, text)| Placed {
                text: text.clone(),
                x: *x,
                y,
                size,
                bold,
            }));
        }
        self.cursor = y;
    }

    fn title(&mut self, text: &str) {
        self.place(&[(MARGIN_LEFT, text.to_string())], TITLE_SIZE, true, TITLE_HEIGHT);
    }

    fn text(&mut self, text: &str) {
        self.place(&[(MARGIN_LEFT, text.to_string())], TEXT_SIZE, false, ROW_HEIGHT);
    }

    /// Heading kept on the same page as at least `follow` rows.
    fn heading(&mut self, text: &str, follow: usize) {
        self.cursor -= SECTION_GAP;
        #[allow(clippy::cast_precision_loss)]
        let follow = follow as f32;
        self.reserve(HEADING_HEIGHT + ROW_HEIGHT * follow);
        self.place(&[(MARGIN_LEFT, text.to_string())], HEADING_SIZE, true, HEADING_HEIGHT);
    }

    fn row(&mut self, cells: [String; 3], bold: bool) {
        let cells: Vec<(f32, String)> = COLUMNS.into_iter().zip(cells).collect();
        self.place(&cells, TEXT_SIZE, bold, ROW_HEIGHT);
    }

    fn key_value(&mut self, key: &str, value: String) {
        self.place(
            &[(COLUMNS[0], key.to_string()), (COLUMNS[1], value)],
            TEXT_SIZE,
            false,
            ROW_HEIGHT,
        );
    }

    fn table<T>(
        &mut self,
        heading: &str,
        header: [&str; 3],
        panel: &Panel<Vec<T>>,
        cells: impl Fn(&T) -> [String; 3],
    ) {
        match panel {
            Panel::Ok { data } if data.is_empty() => {
                self.heading(heading, 1);
                self.text("No data for this period.");
            }
            Panel::Ok { data } => {
                self.heading(heading, 2);
                self.row(header.map(str::to_string), true);
                for item in data {
                    self.row(cells(item), false);
                }
            }
            Panel::Error { message } => {
                self.heading(heading, 1);
                self.text(&label(&format!("Unavailable: {message}")));
            }
        }
    }
}

fn money(amount: Decimal, currency: &str) -> String {
    format!("{:.2} {currency}", amount.round_dp(2))
}

fn label(text: &str) -> String {
    if text.chars().count() > MAX_LABEL_CHARS {
        let cut: String = text.chars().take(MAX_LABEL_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

/// Builtin PDF fonts only cover Latin-1; fold Romanian diacritics to ASCII and
/// replace anything else outside ASCII.
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'ă' | 'â' => 'a',
            'Ă' | 'Â' => 'A',
            'î' => 'i',
            'Î' => 'I',
            'ș' | 'ş' => 's',
            'Ș' | 'Ş' => 'S',
            'ț' | 'ţ' => 't',
            'Ț' | 'Ţ' => 'T',
            c if c.is_ascii() => c,
            _ => '?',
        })
        .collect()
}

/// Place every section of `report` on pages.
#[must_use]
pub fn layout(report: &ReportSet, currency: &str, generated_at: DateTime<Utc>) -> Layout {
    let mut page = Layout::new();

    page.title("Depozit - Sales report");
    page.text(&format!(
        "Period: {} - {}",
        report.range.from.format("%Y-%m-%d"),
        report.range.to.format("%Y-%m-%d")
    ));
    page.text(&format!(
        "Generated: {}",
        generated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    page.heading("Summary", 4);
    match &report.sales_summary {
        Panel::Ok { data } => {
            page.key_value("Sales", data.total_sales.to_string());
            page.key_value("Revenue", money(data.total_revenue, currency));
            page.key_value("Average sale", money(data.average_sale, currency));
            page.key_value("Items sold", data.items_sold.to_string());
        }
        Panel::Error { message } => page.text(&format!("Sales summary unavailable: {message}")),
    }
    match &report.purchase_summary {
        Panel::Ok { data } => {
            page.key_value("Purchase orders", data.total_orders.to_string());
            page.key_value("Spent on purchases", money(data.total_spent, currency));
            page.key_value("Pending orders", data.pending_orders.to_string());
            page.key_value("Received orders", data.received_orders.to_string());
        }
        Panel::Error { message } => {
            page.text(&format!("Purchase summary unavailable: {message}"));
        }
    }

    page.table(
        "Sales by day",
        ["Day", "Sales", "Revenue"],
        &report.sales_by_day,
        |row| {
            [
                row.day.format("%Y-%m-%d").to_string(),
                row.sales_count.to_string(),
                money(row.revenue, currency),
            ]
        },
    );
    page.table(
        "Top products",
        ["Product", "Quantity", "Revenue"],
        &report.top_products,
        |row| {
            [
                label(&row.product_name),
                row.quantity_sold.to_string(),
                money(row.revenue, currency),
            ]
        },
    );
    page.table(
        "Sales by category",
        ["Category", "Quantity", "Revenue"],
        &report.sales_by_category,
        |row| {
            [
                label(&row.category_name),
                row.quantity_sold.to_string(),
                money(row.revenue, currency),
            ]
        },
    );
    page.table(
        "Sales by employee",
        ["Employee", "Sales", "Revenue"],
        &report.sales_by_employee,
        |row| {
            [
                label(&row.employee_name),
                row.sales_count.to_string(),
                money(row.revenue, currency),
            ]
        },
    );
    page.table(
        "Sales by customer",
        ["Customer", "Sales", "Revenue"],
        &report.sales_by_customer,
        |row| {
            [
                label(&row.customer_name),
                row.sales_count.to_string(),
                money(row.revenue, currency),
            ]
        },
    );
    page.table(
        "Sales by payment method",
        ["Method", "Sales", "Revenue"],
        &report.sales_by_payment_method,
        |row| {
            [
                label(&row.payment_method),
                row.sales_count.to_string(),
                money(row.revenue, currency),
            ]
        },
    );

    page
}

/// Paint a layout with the builtin Helvetica faces.
///
/// # Errors
/// Returns an error if the document cannot be assembled.
pub fn render(layout: &Layout, title: &str) -> Result<Vec<u8>, printpdf::Error> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Report");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    for (index, placed) in layout.pages().iter().enumerate() {
        let (page, layer) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Report")
        };
        let canvas = doc.get_page(page).get_layer(layer);
        for item in placed {
            let font = if item.bold { &bold } else { &regular };
            canvas.use_text(printable(&item.text), item.size, Mm(item.x), Mm(item.y), font);
        }
    }

    doc.save_to_bytes()
}

/// Lay out and render `report` in one go.
///
/// # Errors
/// Returns an error if the document cannot be assembled.
pub fn export(
    report: &ReportSet,
    currency: &str,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, printpdf::Error> {
    let title = format!("Depozit report {} - {}", report.range.from, report.range.to);
    render(&layout(report, currency, generated_at), &title)
}

/// Attachment name for an exported report.
#[must_use]
pub fn file_name(report: &ReportSet) -> String {
    format!(
        "report-{}-{}.pdf",
        report.range.from.format("%Y-%m-%d"),
        report.range.to.format("%Y-%m-%d")
    )
}
