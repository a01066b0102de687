// ============================================================
// Layer 4 — Example Scraper
// ============================================================
// Walks an annotated phrase tree and turns every
// (phrase, candidate) pair into a labelled example.
//
// For each phrase, depth first, parent before children:
//
//   1. Take the phrase's ground truth. Only a GroundingSet
//      counts; any other (or missing) grounding means the
//      phrase yields no examples, but its children are still
//      visited.
//   2. For every search-space entry of the phrase:
//        label    = cv_for(candidate, ground truth)
//        context  = (candidate, phrase, world, cv row, source)
//        children = every member of every child phrase's own
//                   ground-truth set (not the child's candidates)
//   3. Recurse into the children, left to right.
//
// The output order is part of the contract: evaluation reports
// refer to examples by their index.
//
// Candidates labelled Unknown (a grounding variant with no
// correspondence rule) are skipped and counted as coverage
// gaps. Entries pointing outside the candidate pool or the
// correspondence table are skipped and counted as dangling.
//
// Reference: Rust Book §8 (Vectors), §18 (Patterns)

use crate::data::example::{ExampleContext, LabeledExample};
use crate::domain::cv::Cv;
use crate::domain::grounding::{cv_for, Grounding};
use crate::domain::phrase::{PhraseId, PhraseTree};
use crate::domain::scene::Scene;
use crate::domain::search_space::{CorrespondenceTable, SearchSpace};
use crate::domain::world::World;

/// Counters collected while scraping, for the run summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeStats {
    pub examples:              usize,
    pub true_labels:           usize,
    /// Phrases whose grounding is absent or not a GroundingSet
    pub phrases_without_truth: usize,
    /// Candidates with no correspondence rule (labelled Unknown)
    pub coverage_gaps:         usize,
    /// Entries whose candidate id or cv index is out of range
    pub dangling_entries:      usize,
}

impl ScrapeStats {
    pub fn merge(&mut self, other: ScrapeStats) {
        self.examples              += other.examples;
        self.true_labels           += other.true_labels;
        self.phrases_without_truth += other.phrases_without_truth;
        self.coverage_gaps         += other.coverage_gaps;
        self.dangling_entries      += other.dangling_entries;
    }
}

/// Scraper over one scene's inputs. All borrows share the lifetime
/// of the resulting examples.
pub struct ExampleScraper<'a> {
    source:         &'a str,
    tree:           &'a PhraseTree,
    world:          &'a World,
    search_space:   &'a SearchSpace,
    correspondence: &'a CorrespondenceTable,
    stats:          ScrapeStats,
}

impl<'a> ExampleScraper<'a> {
    pub fn new(
        source:         &'a str,
        tree:           &'a PhraseTree,
        world:          &'a World,
        search_space:   &'a SearchSpace,
        correspondence: &'a CorrespondenceTable,
    ) -> Self {
        Self { source, tree, world, search_space, correspondence, stats: ScrapeStats::default() }
    }

    pub fn for_scene(scene: &'a Scene) -> Self {
        Self::new(
            &scene.source,
            &scene.tree,
            &scene.world,
            &scene.search_space,
            &scene.correspondence,
        )
    }

    /// Scrape the whole tree from its root
    pub fn scrape(mut self) -> (Vec<LabeledExample<'a>>, ScrapeStats) {
        let mut examples = Vec::new();
        self.visit(self.tree.root(), &mut examples);

        if self.stats.coverage_gaps > 0 {
            tracing::warn!(
                "'{}': skipped {} candidates with no correspondence rule",
                self.source,
                self.stats.coverage_gaps
            );
        }
        if self.stats.dangling_entries > 0 {
            tracing::warn!(
                "'{}': skipped {} dangling search-space entries",
                self.source,
                self.stats.dangling_entries
            );
        }
        tracing::debug!(
            "'{}': scraped {} examples ({} true)",
            self.source,
            self.stats.examples,
            self.stats.true_labels
        );

        (examples, self.stats)
    }

    fn visit(&mut self, id: PhraseId, examples: &mut Vec<LabeledExample<'a>>) {
        let tree  = self.tree;
        let space = self.search_space;
        let table = self.correspondence;
        let Some(phrase) = tree.get(id) else {
            return;
        };

        match phrase.grounding.as_ref().and_then(Grounding::as_set) {
            Some(truth) => {
                // Same child context for every candidate of this phrase
                let children: Vec<&'a Grounding> = phrase
                    .children()
                    .iter()
                    .filter_map(|&child| tree.get(child))
                    .filter_map(|child| child.grounding.as_ref().and_then(Grounding::as_set))
                    .flat_map(|set| set.iter())
                    .collect();

                for entry in space.entries_for(id) {
                    let candidate = space.pool.get(entry.candidate);
                    let cvs       = table.row(entry.cv_index);
                    let (Some(candidate), Some(cvs)) = (candidate, cvs) else {
                        self.stats.dangling_entries += 1;
                        continue;
                    };

                    let label = cv_for(candidate, truth);
                    match label {
                        Cv::Unknown => {
                            self.stats.coverage_gaps += 1;
                            continue;
                        }
                        Cv::True => self.stats.true_labels += 1,
                        Cv::False => {}
                    }

                    examples.push(LabeledExample::new(
                        label,
                        ExampleContext {
                            grounding: candidate,
                            phrase,
                            world:     self.world,
                            cvs,
                            source:    self.source,
                            children:  children.clone(),
                        },
                    ));
                    self.stats.examples += 1;
                }
            }
            None => self.stats.phrases_without_truth += 1,
        }

        for &child in phrase.children() {
            self.visit(child, examples);
        }
    }
}

/// Scrape one scene's phrase tree into labelled examples.
pub fn scrape<'a>(
    source:         &'a str,
    tree:           &'a PhraseTree,
    world:          &'a World,
    search_space:   &'a SearchSpace,
    correspondence: &'a CorrespondenceTable,
) -> Vec<LabeledExample<'a>> {
    ExampleScraper::new(source, tree, world, search_space, correspondence)
        .scrape()
        .0
}

/// Scrape every scene in order, concatenating the examples.
pub fn scrape_scenes(scenes: &[Scene]) -> (Vec<LabeledExample<'_>>, ScrapeStats) {
    let mut examples = Vec::new();
    let mut stats    = ScrapeStats::default();
    for scene in scenes {
        let (mut scraped, scene_stats) = ExampleScraper::for_scene(scene).scrape();
        examples.append(&mut scraped);
        stats.merge(scene_stats);
    }
    (examples, stats)
}
