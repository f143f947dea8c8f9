use crate::quiz::content::{fill, Strings};
use crate::quiz::scores::{Axis, ScoreVector};

/// Inclusive score range on one axis mapped to a title.
///
/// `pure` marks the range where the axis has negligible influence; when the
/// secondary axis lands there the result is phrased as a pure archetype.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TitleDescriptor {
    #[serde(rename = "scoreMin")]
    pub score_min: u32,
    #[serde(rename = "scoreMax")]
    pub score_max: u32,
    pub title: String,
    #[serde(default)]
    pub pure: bool,
}

impl TitleDescriptor {
    pub fn new(score_min: u32, score_max: u32, title: &str) -> Self {
        Self {
            score_min,
            score_max,
            title: title.to_string(),
            pure: false,
        }
    }

    pub fn pure(mut self) -> Self {
        self.pure = true;
        self
    }

    pub fn contains(&self, score: u32) -> bool {
        self.score_min <= score && score <= self.score_max
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TitleGrid {
    pub catholic: Vec<TitleDescriptor>,
    pub liberal: Vec<TitleDescriptor>,
    pub protestant: Vec<TitleDescriptor>,
}

impl TitleGrid {
    pub fn axis(&self, axis: Axis) -> &[TitleDescriptor] {
        match axis {
            Axis::Catholic => &self.catholic,
            Axis::Liberal => &self.liberal,
            Axis::Protestant => &self.protestant,
        }
    }

    pub fn descriptor(&self, axis: Axis, score: u32) -> Option<&TitleDescriptor> {
        self.axis(axis).iter().find(|d| d.contains(score))
    }

    /// Overlaps and holes in `0..=max` for one axis, as readable messages.
    pub fn coverage_gaps(&self, axis: Axis, max: u32) -> Vec<String> {
        let mut problems = Vec::new();
        let mut ranges: Vec<_> = self.axis(axis).iter().collect();
        ranges.sort_by_key(|d| d.score_min);

        let mut next = 0u32;
        for d in ranges {
            if d.score_min > d.score_max {
                problems.push(format!("'{}' has an empty range", d.title));
                continue;
            }
            if d.score_min > next {
                problems.push(format!("scores {}..{} have no title", next, d.score_min - 1));
            } else if d.score_min < next {
                problems.push(format!("'{}' overlaps a previous range", d.title));
            }
            next = next.max(d.score_max.saturating_add(1));
        }
        if next <= max {
            problems.push(format!("scores {}..{} have no title", next, max));
        }
        problems
    }
}

/// Title for `score` on `axis`, or an empty string when no range matches.
pub fn resolve_axis_title(grid: &TitleGrid, axis: Axis, score: u32) -> String {
    grid.descriptor(axis, score)
        .map(|d| d.title.clone())
        .unwrap_or_default()
}

/// Combine the two strongest axes into the final label: the secondary axis
/// supplies the adjective, the primary one the noun.
pub fn compose_result_title(grid: &TitleGrid, strings: &Strings, scores: &ScoreVector) -> String {
    let [(primary, primary_score), (secondary, secondary_score), _] = scores.ranked();

    let noun = resolve_axis_title(grid, primary, primary_score);
    let adjective = grid.descriptor(secondary, secondary_score);

    match adjective {
        Some(d) if d.pure => fill(&strings.pure_title_template, &[("noun", &noun)]),
        _ => {
            let adjective = adjective.map(|d| d.title.as_str()).unwrap_or_default();
            fill(
                &strings.adjective_title_template,
                &[("adjective", adjective), ("noun", &noun)],
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::content::Content;
    use rstest::rstest;

    fn grid() -> TitleGrid {
        let axis = |low: &str, mid: &str, high: &str| {
            vec![
                TitleDescriptor::new(0, 5, "Purely-Inclined").pure(),
                TitleDescriptor::new(6, 20, low),
                TitleDescriptor::new(21, 35, mid),
                TitleDescriptor::new(36, 45, high),
            ]
        };
        TitleGrid {
            catholic: axis("Sacramental", "High-Church", "Anglo-Catholic"),
            liberal: axis("Questioning", "Broad-Church", "Latitudinarian"),
            protestant: axis("Reformed", "Low-Church", "Evangelical"),
        }
    }

    fn strings() -> Strings {
        let en = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/content/en.json"));
        let mut strings = Content::from_reader(en.as_bytes()).unwrap().strings;
        strings.adjective_title_template = "{{adjective}} {{noun}}".to_string();
        strings.pure_title_template = "Pure {{noun}}".to_string();
        strings
    }

    #[rstest]
    #[case(Axis::Catholic, 0, "Purely-Inclined")]
    #[case(Axis::Catholic, 5, "Purely-Inclined")]
    #[case(Axis::Catholic, 6, "Sacramental")]
    #[case(Axis::Liberal, 35, "Broad-Church")]
    #[case(Axis::Protestant, 45, "Evangelical")]
    #[case(Axis::Protestant, 46, "")]
    #[case(Axis::Liberal, u32::MAX, "")]
    fn axis_title_lookup(#[case] axis: Axis, #[case] score: u32, #[case] expected: &str) {
        assert_eq!(resolve_axis_title(&grid(), axis, score), expected);
    }

    #[test]
    fn first_matching_range_wins() {
        let mut grid = grid();
        grid.catholic.insert(0, TitleDescriptor::new(0, 10, "Shadow"));
        assert_eq!(resolve_axis_title(&grid, Axis::Catholic, 3), "Shadow");
    }

    #[rstest]
    #[case(ScoreVector::new(45, 0, 0), "Pure Anglo-Catholic")]
    #[case(ScoreVector::new(10, 0, 30), "Sacramental Low-Church")]
    #[case(ScoreVector::new(0, 25, 20), "Reformed Broad-Church")]
    #[case(ScoreVector::ZERO, "Pure Purely-Inclined")]
    fn composed_titles(#[case] scores: ScoreVector, #[case] expected: &str) {
        assert_eq!(compose_result_title(&grid(), &strings(), &scores), expected);
    }

    #[test]
    fn tie_on_top_prefers_declaration_order() {
        let scores = ScoreVector::new(15, 15, 15);
        let first = compose_result_title(&grid(), &strings(), &scores);
        assert_eq!(first, "Questioning Sacramental");
        for _ in 0..10 {
            assert_eq!(compose_result_title(&grid(), &strings(), &scores), first);
        }
    }

    #[test]
    fn missing_titles_leave_empty_segments() {
        let mut grid = grid();
        grid.protestant.clear();
        let title = compose_result_title(&grid, &strings(), &ScoreVector::new(7, 0, 30));
        assert_eq!(title, "Sacramental ");
    }

    #[test]
    fn coverage_gaps_reports_holes_and_overlaps() {
        assert!(grid().coverage_gaps(Axis::Catholic, 45).is_empty());

        let mut broken = grid();
        broken.liberal.remove(1);
        broken.liberal.push(TitleDescriptor::new(30, 40, "Overlap"));
        let problems = broken.coverage_gaps(Axis::Liberal, 50);
        assert_eq!(problems.len(), 4, "{:?}", problems);
    }
}
