//! Search adapters, one per surface.

pub mod arxiv;
pub mod scraped;

pub use arxiv::ArxivAdapter;
pub use scraped::{FpoSurface, GooglePatentsSurface, PatentWebSurface, ScrapedAdapter};

use std::sync::Arc;

use tracing::warn;

use prior_config::{Browser, PatentSource};
use prior_domain::SurfaceKind;

use crate::{SearchAdapter, browser::SessionPool, harvest::ScrapedSurface};

/// One scraped adapter per configured patent surface, all drawing from `pool`.
pub fn scraped_adapters(
	cfg: &PatentSource,
	browser: &Browser,
	pool: &SessionPool,
) -> Vec<Arc<dyn SearchAdapter>> {
	let mut adapters: Vec<Arc<dyn SearchAdapter>> = Vec::with_capacity(cfg.surfaces.len());

	for name in &cfg.surfaces {
		let surface: Arc<dyn ScrapedSurface> = match SurfaceKind::from_patent_surface(name) {
			Some(SurfaceKind::FreePatentsOnline) => Arc::new(FpoSurface::new(&cfg.fpo_base)),
			Some(SurfaceKind::GooglePatents) => Arc::new(GooglePatentsSurface::new(&cfg.google_base)),
			Some(SurfaceKind::PatentWeb) => {
				Arc::new(PatentWebSurface::new(&cfg.web_search_base, &cfg.google_base))
			},
			_ => {
				warn!(surface = %name, "Ignoring unknown patent surface.");

				continue;
			},
		};

		adapters.push(Arc::new(ScrapedAdapter::new(surface, pool.clone(), browser)));
	}

	adapters
}
