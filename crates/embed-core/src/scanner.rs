//! Element Scanner
//!
//! One-shot pass over the marker elements present at initialization.
//! Every marker is built on its own: a bad configuration is logged and
//! reported but never blocks the markers after it.

use std::rc::Rc;

use crate::config::{ConfigBuilder, ProductVariant};
use crate::error::{EmbedError, Result};
use crate::mount::MarkerElement;
use crate::registry::WidgetRegistry;
use crate::widget::{Widget, WidgetHost};

/// A marker that could not be turned into a widget
#[derive(Debug)]
pub struct ScanFailure {
    /// Position of the marker in scan order
    pub index: usize,
    pub error: EmbedError,
}

/// Outcome of a scan
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Widgets mounted by this scan, in document order
    pub mounted: Vec<Widget>,
    /// Markers skipped because they already carry a reference
    pub skipped: usize,
    pub failures: Vec<ScanFailure>,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Builds widgets for the markers of a page
pub struct ElementScanner {
    host: WidgetHost,
    registry: Rc<WidgetRegistry>,
}

impl ElementScanner {
    pub const fn new(host: WidgetHost, registry: Rc<WidgetRegistry>) -> Self {
        Self { host, registry }
    }

    pub fn registry(&self) -> &Rc<WidgetRegistry> {
        &self.registry
    }

    /// Build a widget for each marker of `variant`
    pub fn scan<M: MarkerElement>(&self, variant: ProductVariant, markers: &[M]) -> ScanReport {
        let mut report = ScanReport::default();

        for (index, marker) in markers.iter().enumerate() {
            if marker.is_mounted() {
                tracing::debug!(variant = %variant, index, "Marker already mounted, skipping");
                report.skipped += 1;
                continue;
            }

            match self.build_one(variant, marker) {
                Ok(widget) => {
                    self.registry.insert(widget.clone());
                    report.mounted.push(widget);
                }
                Err(error) => {
                    tracing::error!(
                        variant = %variant,
                        index,
                        error = %error,
                        "{}",
                        error.user_message()
                    );
                    report.failures.push(ScanFailure { index, error });
                }
            }
        }

        tracing::info!(
            variant = %variant,
            mounted = report.mounted.len(),
            skipped = report.skipped,
            failed = report.failures.len(),
            "Marker scan complete"
        );
        report
    }

    fn build_one(&self, variant: ProductVariant, marker: &dyn MarkerElement) -> Result<Widget> {
        let config = ConfigBuilder::new(variant).build(marker)?;
        Widget::build(self.registry.allocate_id(), config, &self.host, marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::MemoryCookieStore;
    use crate::error::ConfigError;
    use crate::settings::EmbedSettings;
    use crate::testing::{FakeMarker, RecordingPage};

    fn scanner() -> ElementScanner {
        ElementScanner::new(
            WidgetHost {
                settings: EmbedSettings::default(),
                cookies: Rc::new(MemoryCookieStore::new()),
                page: Rc::new(RecordingPage::default()),
            },
            Rc::new(WidgetRegistry::new()),
        )
    }

    #[test]
    fn test_bad_marker_does_not_block_siblings() {
        let markers = vec![
            FakeMarker::new(&[("data-embed-token", "tok1")]),
            FakeMarker::new(&[("data-embed-token", "tok2"), ("data-eth", "0.5")]),
            FakeMarker::new(&[("data-btc", "0.01")]),
        ];
        let scanner = scanner();
        let report = scanner.scan(ProductVariant::PaymentRequest, &markers);

        assert_eq!(report.mounted.len(), 1);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].index, 0);
        assert!(matches!(
            report.failures[0].error,
            EmbedError::Config(ConfigError::MissingOption(_))
        ));
        assert!(matches!(
            report.failures[1].error,
            EmbedError::Config(ConfigError::MissingRequiredAttribute(_))
        ));
        assert!(markers[1].mounted_src().is_some());
        assert_eq!(scanner.registry().len(), 1);
    }

    #[test]
    fn test_already_mounted_marker_is_skipped() {
        let markers = vec![FakeMarker::new(&[
            ("data-embed-token", "tok1"),
            ("data-btc", "0.01"),
            ("data-ref", "1234a678"),
        ])];
        let report = scanner().scan(ProductVariant::PaymentRequest, &markers);
        assert_eq!(report.skipped, 1);
        assert!(report.mounted.is_empty());
        assert!(markers[0].mounted_src().is_none());
    }

    #[test]
    fn test_rescan_skips_mounted_markers() {
        let markers = vec![FakeMarker::new(&[("data-embed-token", "tok1"), ("data-btc", "0.01")])];
        let scanner = scanner();
        let first = scanner.scan(ProductVariant::PaymentRequest, &markers);
        let second = scanner.scan(ProductVariant::PaymentRequest, &markers);

        assert_eq!(first.mounted.len(), 1);
        assert_eq!(second.skipped, 1);
        assert_eq!(scanner.registry().len(), 1);
    }
}
