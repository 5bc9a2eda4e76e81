//! Per-plan option tables.
//!
//! One parameterized table per plan tier drives every pricing and selection
//! rule; nothing downstream special-cases a plan by name.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::plan::PlanType;
use crate::domain::selection::DesignStyle;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineOption {
    pub weeks: u8,
    pub is_urgent: bool,
    pub urgent_surcharge: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "max")]
pub enum PageLimit {
    Limited(usize),
    Unlimited,
}

impl PageLimit {
    pub fn allows(&self, page_count: usize) -> bool {
        match self {
            Self::Limited(max) => page_count <= *max,
            Self::Unlimited => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub plan: PlanType,
    pub base_price: Decimal,
    pub page_limit: PageLimit,
    pub color_limit: usize,
    pub animation_limit: usize,
    pub feature_prices: BTreeMap<String, Decimal>,
    pub animation_prices: BTreeMap<String, Decimal>,
    pub deadline_options: Vec<DeadlineOption>,
    pub default_deadline_weeks: u8,
    pub design_styles: Vec<DesignStyle>,
    pub page_options: Vec<String>,
    pub fixed_pages: Vec<String>,
    pub default_pages: Vec<String>,
    pub palette: Vec<String>,
}

impl CatalogEntry {
    pub fn deadline(&self, weeks: u8) -> Option<&DeadlineOption> {
        self.deadline_options.iter().find(|option| option.weeks == weeks)
    }

    pub fn urgent_option(&self) -> Option<&DeadlineOption> {
        self.deadline_options.iter().find(|option| option.is_urgent)
    }

    pub fn feature_price(&self, feature: &str) -> Option<Decimal> {
        self.feature_prices.get(feature).copied()
    }

    /// Unlisted animations carry no surcharge.
    pub fn animation_price(&self, animation: &str) -> Decimal {
        self.animation_prices.get(animation).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn supports_animations(&self) -> bool {
        self.animation_limit > 0
    }

    pub fn is_fixed_page(&self, page: &str) -> bool {
        self.fixed_pages.iter().any(|fixed| fixed == page)
    }

    pub fn offers_page(&self, page: &str) -> bool {
        self.page_options.iter().any(|option| option == page)
    }

    pub fn offers_design(&self, design: DesignStyle) -> bool {
        self.design_styles.contains(&design)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// The three published plan tiers.
    pub fn standard() -> &'static Catalog {
        static STANDARD: OnceLock<Catalog> = OnceLock::new();
        STANDARD.get_or_init(|| {
            Catalog::new(vec![basic_entry(), intermediate_entry(), advanced_entry()])
        })
    }

    pub fn entry(&self, plan: PlanType) -> Result<&CatalogEntry, DomainError> {
        self.entries
            .iter()
            .find(|entry| entry.plan == plan)
            .ok_or_else(|| DomainError::UnknownPlan { plan: plan.to_string() })
    }

    pub fn for_key(&self, plan_key: &str) -> Result<&CatalogEntry, DomainError> {
        self.entry(plan_key.parse()?)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }
}

fn amount(value: i64) -> Decimal {
    Decimal::from(value)
}

fn price_table(rows: &[(&str, i64)]) -> BTreeMap<String, Decimal> {
    rows.iter().map(|(key, price)| ((*key).to_owned(), amount(*price))).collect()
}

fn keys(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

fn deadlines(urgent_surcharge: i64, regular_weeks: &[u8]) -> Vec<DeadlineOption> {
    let mut options =
        vec![DeadlineOption { weeks: 2, is_urgent: true, urgent_surcharge: amount(urgent_surcharge) }];
    options.extend(regular_weeks.iter().map(|weeks| DeadlineOption {
        weeks: *weeks,
        is_urgent: false,
        urgent_surcharge: Decimal::ZERO,
    }));
    options
}

const BASIC_PAGES: [&str; 5] = ["home", "about", "services", "contact", "gallery"];
const BASIC_PALETTE: [&str; 9] =
    ["red", "blue", "green", "orange", "purple", "turquoise", "darkblue", "white", "black"];

fn basic_entry() -> CatalogEntry {
    CatalogEntry {
        plan: PlanType::Basic,
        base_price: amount(12_000),
        page_limit: PageLimit::Limited(5),
        color_limit: 3,
        animation_limit: 0,
        feature_prices: price_table(&[
            ("contact-form", 500),
            ("optimized-images", 800),
            ("social-links", 600),
        ]),
        animation_prices: BTreeMap::new(),
        deadline_options: deadlines(2_500, &[3, 4]),
        default_deadline_weeks: 4,
        design_styles: vec![DesignStyle::Modern, DesignStyle::Elegant, DesignStyle::Minimalist],
        page_options: keys(&BASIC_PAGES),
        fixed_pages: keys(&["home"]),
        default_pages: keys(&["home"]),
        palette: keys(&BASIC_PALETTE),
    }
}

fn intermediate_entry() -> CatalogEntry {
    let mut page_options = keys(&BASIC_PAGES);
    page_options.extend(keys(&["faq", "blog", "location"]));
    let mut palette = keys(&BASIC_PALETTE);
    palette.extend(keys(&["gold", "pink"]));

    CatalogEntry {
        plan: PlanType::Intermediate,
        base_price: amount(19_000),
        page_limit: PageLimit::Limited(8),
        color_limit: 4,
        animation_limit: 3,
        feature_prices: price_table(&[
            ("booking-system", 2_500),
            ("multi-language", 1_800),
            ("custom-forms", 1_200),
            ("analytics", 1_000),
            ("chat", 1_500),
        ]),
        animation_prices: price_table(&[("fade", 500), ("slide", 700), ("parallax", 1_200)]),
        deadline_options: deadlines(3_500, &[3, 5, 6]),
        default_deadline_weeks: 5,
        design_styles: vec![
            DesignStyle::Modern,
            DesignStyle::Elegant,
            DesignStyle::Minimalist,
            DesignStyle::Luxury,
            DesignStyle::Corporate,
            DesignStyle::Creative,
        ],
        page_options,
        fixed_pages: keys(&["home"]),
        default_pages: keys(&BASIC_PAGES),
        palette,
    }
}

fn advanced_entry() -> CatalogEntry {
    let mut page_options = keys(&BASIC_PAGES);
    page_options.extend(keys(&[
        "faq",
        "blog",
        "location",
        "booking",
        "testimonials",
        "partnerships",
    ]));
    let mut palette = keys(&BASIC_PALETTE);
    palette.extend(keys(&["gold", "pink", "silver"]));

    CatalogEntry {
        plan: PlanType::Advanced,
        base_price: amount(32_000),
        page_limit: PageLimit::Unlimited,
        color_limit: 5,
        animation_limit: 5,
        feature_prices: price_table(&[
            ("payment-gateway", 3_500),
            ("user-accounts", 2_800),
            ("reviews", 1_500),
            ("api-integration", 3_000),
            ("custom-dashboard", 4_000),
        ]),
        // fade, slide and parallax are bundled into the advanced base price
        animation_prices: price_table(&[
            ("fade", 0),
            ("slide", 0),
            ("parallax", 0),
            ("advanced", 1_500),
            ("3d", 2_500),
            ("interactive", 3_000),
        ]),
        deadline_options: deadlines(5_000, &[4, 6, 8]),
        default_deadline_weeks: 8,
        design_styles: vec![
            DesignStyle::Modern,
            DesignStyle::Elegant,
            DesignStyle::Minimalist,
            DesignStyle::Luxury,
            DesignStyle::Corporate,
            DesignStyle::Creative,
            DesignStyle::Custom,
        ],
        page_options,
        fixed_pages: keys(&["home", "about", "services", "contact", "gallery", "faq"]),
        default_pages: keys(&[
            "home", "about", "services", "contact", "gallery", "faq", "blog", "location", "booking",
        ]),
        palette,
    }
}
