use serde::Deserialize;

static MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

static WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Placeholder in the total-count template that is replaced with the total
pub(crate) const COUNT_PLACEHOLDER: &str = "{count}";

static TOTAL_COUNT: &str = "Total submissions: {count}";

static LEGEND_LESS: &str = "Few submissions";

static LEGEND_MORE: &str = "Many submissions";

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct LabelSet {
    pub(crate) months: Vec<String>,
    pub(crate) weekdays: Vec<String>,
    pub(crate) total_count: String,
    pub(crate) legend_less: String,
    pub(crate) legend_more: String,
}

impl Default for LabelSet {
    fn default() -> LabelSet {
        LabelSet {
            months: MONTHS.iter().map(|&s| s.to_owned()).collect(),
            weekdays: WEEKDAYS.iter().map(|&s| s.to_owned()).collect(),
            total_count: TOTAL_COUNT.to_owned(),
            legend_less: LEGEND_LESS.to_owned(),
            legend_more: LEGEND_MORE.to_owned(),
        }
    }
}

impl LabelSet {
    /// Layers `overrides` over the English defaults, field by field.  Empty
    /// strings and lists count as absent.
    pub(crate) fn resolve(overrides: &LabelOverrides) -> LabelSet {
        let mut labels = LabelSet::default();
        if let Some(months) = overrides.months.as_ref().filter(|v| !v.is_empty()) {
            labels.months.clone_from(months);
        }
        if let Some(weekdays) = overrides.weekdays.as_ref().filter(|v| !v.is_empty()) {
            labels.weekdays.clone_from(weekdays);
        }
        if let Some(total) = non_empty(overrides.total_count.as_ref()) {
            labels.total_count.clone_from(total);
        }
        if let Some(less) = non_empty(overrides.legend.less.as_ref()) {
            labels.legend_less.clone_from(less);
        }
        if let Some(more) = non_empty(overrides.legend.more.as_ref()) {
            labels.legend_more.clone_from(more);
        }
        labels
    }

    /// Renders the total-count template for the given total
    pub(crate) fn total_count_text(&self, total: u64) -> String {
        self.total_count
            .replace(COUNT_PLACEHOLDER, &total.to_string())
    }

    /// Returns the month abbreviation for a month number in `1..=12`
    pub(crate) fn month(&self, month: u8) -> Option<&str> {
        self.months
            .get(usize::from(month).checked_sub(1)?)
            .map(String::as_str)
    }
}

fn non_empty(s: Option<&String>) -> Option<&String> {
    s.filter(|s| !s.is_empty())
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct LabelOverrides {
    pub(crate) months: Option<Vec<String>>,
    pub(crate) weekdays: Option<Vec<String>>,
    pub(crate) total_count: Option<String>,
    pub(crate) legend: LegendOverrides,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LegendOverrides {
    pub(crate) less: Option<String>,
    pub(crate) more: Option<String>,
}
