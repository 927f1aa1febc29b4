use std::collections::HashMap;

use serde::Serialize;

/// Positional `(names, data)` pair consumed by a chart: `names[i]` labels
/// `data[i]`, and `show_value[i]`, when present, is its display rendering.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesBundle {
    pub names: Vec<String>,
    pub data: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_value: Option<Vec<String>>,
}

impl SeriesBundle {
    pub fn new(unit: Option<String>, with_display: bool) -> Self {
        Self {
            names: Vec::new(),
            data: Vec::new(),
            unit,
            show_value: if with_display { Some(Vec::new()) } else { None },
        }
    }

    pub fn push(&mut self, name: String, value: f64, display: Option<String>) {
        self.names.push(name);
        self.data.push(value);
        if let Some(show_value) = self.show_value.as_mut() {
            show_value.push(display.unwrap_or_else(|| value.to_string()));
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.position(name).map(|i| self.data[i])
    }

    /// Position of the `nth` point named `name`, counting from zero.
    pub fn nth_position(&self, name: &str, nth: usize) -> Option<usize> {
        self.names
            .iter()
            .enumerate()
            .filter(|(_, n)| *n == name)
            .map(|(i, _)| i)
            .nth(nth)
    }

    /// Names of `bundles` in first-seen order. A name repeated within one
    /// bundle appears as many times as the bundle repeating it most.
    pub fn union_names<'a, I>(bundles: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a SeriesBundle>,
    {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut names = Vec::new();

        for bundle in bundles {
            let mut local: HashMap<&str, usize> = HashMap::new();
            for name in &bundle.names {
                let seen = local.entry(name.as_str()).or_insert(0);
                *seen += 1;
                let total = counts.entry(name.as_str()).or_insert(0);
                if *seen > *total {
                    *total = *seen;
                    names.push(name.clone());
                }
            }
        }

        names
    }

    /// Re-indexes the bundle onto `names`. The k-th occurrence of a name in
    /// `names` takes the bundle's k-th point of that name, so points sharing
    /// a label keep their own values. Names the bundle lacks get a zero value
    /// rendered as `zero_display`.
    pub fn aligned(&self, names: &[String], unit: Option<String>, zero_display: Option<&str>) -> Self {
        let with_display = self.show_value.is_some() || zero_display.is_some();
        let mut aligned = Self::new(self.unit.clone().or(unit), with_display);

        let mut occurrences: HashMap<&str, usize> = HashMap::new();
        for name in names {
            let nth = occurrences.entry(name.as_str()).or_insert(0);
            match self.nth_position(name, *nth) {
                Some(i) => {
                    let display = self.show_value.as_ref().map(|sv| sv[i].clone());
                    aligned.push(name.clone(), self.data[i], display);
                }
                None => aligned.push(name.clone(), 0.0, zero_display.map(str::to_owned)),
            }
            *nth += 1;
        }

        aligned
    }
}
