use std::sync::Arc;

use crate::certificates::{
    certificate_filename, Certificate, CertificateBatch, CertificateCategory, CertificateStore,
    CertificateTemplate, CertificateType,
};
use crate::directory::{Club, Directory};
use crate::documents::{
    ag30, ag30_header, brand_logo, default_layout, dollar_amount, format_message, labels,
    num_nights, num_players, prestige, Artwork, AssetStore, Canvas, CertificateView, ClubBlock,
    ClubListing, DocumentError, DEFAULT_DOUBLE_HEADER, DEFAULT_HEADER, FALLBACK_CLUB_LOGO,
    PLAYERS_CLUB_LOGO, PRESTIGE_50_HEADER,
};
use crate::locale::Locale;
use crate::validation::sanitize_text;

/// Draw an image, logging instead of failing when it cannot be decoded
pub fn draw_artwork(
    canvas: &Canvas,
    what: &str,
    bytes: &[u8],
    area: (f32, f32, f32, f32),
    max_pixels: Option<u32>,
    preserve_aspect: bool,
) {
    if let Err(e) = canvas.image(bytes, area, max_pixels, preserve_aspect) {
        tracing::error!("Could not draw {}: {}", what, e);
    }
}

/// Render a prepared certificate to PDF bytes
pub fn generate(view: &CertificateView) -> Result<Vec<u8>, DocumentError> {
    let canvas = Canvas::new(labels(view.locale).title)?;

    match view.template {
        CertificateTemplate::Default => default_layout::draw(&canvas, view)?,
        CertificateTemplate::Ag30 => ag30::draw(&canvas, view)?,
        CertificateTemplate::Prestige50 | CertificateTemplate::GolfForLife => {
            prestige::draw(&canvas, view)?
        }
    }

    canvas.finish()
}

/// A rendered certificate and the name it is downloaded under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCertificate {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Loads certificate data and artwork, then renders off the async runtime
#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn CertificateStore>,
    directory: Arc<dyn Directory>,
    assets: Arc<dyn AssetStore>,
}

impl DocumentService {
    pub fn new(
        store: Arc<dyn CertificateStore>,
        directory: Arc<dyn Directory>,
        assets: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            store,
            directory,
            assets,
        }
    }

    /// Render one certificate
    ///
    /// # Arguments
    /// * `batch` - the owning batch; certificates without one render in English with no
    ///   recipient
    pub async fn render(
        &self,
        certificate: &Certificate,
        batch: Option<&CertificateBatch>,
    ) -> Result<RenderedCertificate, DocumentError> {
        let view = self.prepare(certificate, batch).await?;
        let filename = certificate_filename(view.template, &view.club_name, &certificate.code);

        let bytes = tokio::task::spawn_blocking(move || generate(&view))
            .await
            .map_err(|e| DocumentError::Task(e.to_string()))??;

        tracing::debug!("Rendered certificate {} ({} bytes)", certificate.code, bytes.len());
        Ok(RenderedCertificate { filename, bytes })
    }

    /// Render every certificate of a batch in creation order
    pub async fn render_batch(&self, batch: &CertificateBatch) -> Result<Vec<RenderedCertificate>, DocumentError> {
        let mut rendered = Vec::new();
        for certificate in self.store.certificates_for_batch(batch.id).await? {
            rendered.push(self.render(&certificate, Some(batch)).await?);
        }
        Ok(rendered)
    }

    /// Resolve text, clubs and artwork for a certificate
    pub async fn prepare(
        &self,
        certificate: &Certificate,
        batch: Option<&CertificateBatch>,
    ) -> Result<CertificateView, DocumentError> {
        let certificate_type = self
            .store
            .find_type(certificate.certificate_type_id)
            .await?
            .ok_or(DocumentError::TypeNotFound(certificate.certificate_type_id))?;
        let club = self
            .directory
            .find_club(certificate.club_id)
            .await?
            .ok_or(DocumentError::ClubNotFound(certificate.club_id))?;
        let secondary = match certificate.club_secondary_id {
            Some(id) if id != club.id => self.directory.find_club(id).await?,
            _ => None,
        };

        let locale = batch.map(CertificateBatch::locale).unwrap_or_default();
        let category = certificate_type.category;

        let fill = |text: &str| {
            format_message(
                &sanitize_text(text),
                category,
                certificate.quantity,
                certificate.tax,
                certificate.power_cart,
                locale,
            )
        };

        let message = match certificate.message.as_deref().filter(|m| !m.trim().is_empty()) {
            Some(message) => fill(message),
            None => fill(certificate_type.message.resolve(locale)),
        };

        let restrictions = match category {
            CertificateCategory::LeftSideCustom => None,
            _ => Some(fill(certificate_type.restrictions.resolve(locale))),
        };

        let recipient_name = match (certificate_type.hide_recipient_name, batch) {
            (false, Some(batch)) => Some(batch.recipient_name.clone()),
            _ => None,
        };

        let redemption_details = sanitize_text(certificate_type.redemption_details.resolve(locale));
        let redemption = (!redemption_details.is_empty()).then(|| {
            (
                labels(locale)
                    .redemption_location(&certificate_type.redemption_location)
                    .to_string(),
                redemption_details,
            )
        });

        let clubs = self
            .club_listing(&certificate_type, &club, secondary.as_ref())
            .await?;
        let artwork = self
            .artwork(&certificate_type, &club, secondary.as_ref(), locale)
            .await;

        Ok(CertificateView {
            locale,
            code: certificate.code.clone(),
            category,
            template: certificate_type.template,
            headline: certificate_type.name.resolve(locale).to_string(),
            recipient_name,
            message,
            restrictions,
            expiry_date: certificate.expiry_date,
            club_name: club.name.clone(),
            clubs,
            num_players: num_players(category, certificate.quantity),
            num_nights: num_nights(category, certificate.quantity),
            dollar_amount: dollar_amount(category, certificate.quantity, certificate.tax),
            redemption,
            artwork,
        })
    }

    async fn club_listing(
        &self,
        certificate_type: &CertificateType,
        club: &Club,
        secondary: Option<&Club>,
    ) -> Result<ClubListing, DocumentError> {
        Ok(match certificate_type.category {
            CertificateCategory::PlayersClub => {
                let names = self
                    .store
                    .players_club_clubs(certificate_type.id)
                    .await?
                    .into_iter()
                    .map(|listed| {
                        if certificate_type.players_club_daily_fee_listing && listed.daily_fee_location {
                            format!("{} - Daily Fee", listed.name)
                        } else {
                            listed.name
                        }
                    })
                    .collect();
                ClubListing::PlayersClub(names)
            }
            CertificateCategory::Merchandise => ClubListing::ClubLinkWide,
            _ => ClubListing::Clubs {
                primary: ClubBlock::from(club),
                secondary: secondary.map(ClubBlock::from),
            },
        })
    }

    async fn club_logo(&self, club: &Club) -> Option<Vec<u8>> {
        let logo = club.logo.as_deref()?;
        match self.assets.media(logo).await {
            Some(bytes) => Some(bytes),
            None => self.assets.static_asset(FALLBACK_CLUB_LOGO).await,
        }
    }

    async fn artwork(
        &self,
        certificate_type: &CertificateType,
        club: &Club,
        secondary: Option<&Club>,
        locale: Locale,
    ) -> Artwork {
        let category = certificate_type.category;

        // Two different clubs prefer the double header
        let effective_header = match secondary {
            Some(_) => certificate_type
                .double_header
                .as_deref()
                .or(certificate_type.header.as_deref()),
            None => certificate_type.header.as_deref(),
        };
        let header = match effective_header {
            Some(name) => self.assets.media(name).await,
            None => None,
        };
        let header = match header {
            Some(header) => Some(header),
            None => {
                let fallback = match certificate_type.template {
                    CertificateTemplate::Default if secondary.is_some() => DEFAULT_DOUBLE_HEADER.to_string(),
                    CertificateTemplate::Default => DEFAULT_HEADER.to_string(),
                    CertificateTemplate::Ag30 => ag30_header(locale),
                    CertificateTemplate::Prestige50 | CertificateTemplate::GolfForLife => {
                        PRESTIGE_50_HEADER.to_string()
                    }
                };
                self.assets.static_asset(&fallback).await
            }
        };

        let primary_logo = match category {
            CertificateCategory::PlayersClub => self.assets.static_asset(PLAYERS_CLUB_LOGO).await,
            CertificateCategory::Merchandise => self.assets.static_asset(&brand_logo(locale)).await,
            _ => self.club_logo(club).await,
        };
        let secondary_logo = match (category, secondary) {
            (CertificateCategory::PlayersClub | CertificateCategory::Merchandise, _) => None,
            (_, Some(secondary)) => self.club_logo(secondary).await,
            (_, None) => None,
        };

        let brand = match certificate_type.template {
            CertificateTemplate::Default => self.assets.static_asset(&brand_logo(locale)).await,
            _ => None,
        };

        let advertisement = match certificate_type.advertisement_id {
            Some(id) => match self.store.find_advertisement(id).await {
                Ok(Some(ad)) => {
                    let image = self.assets.media(ad.image_for(locale)).await;
                    if image.is_none() {
                        tracing::error!("Could not load advertisement {}", ad.name);
                    }
                    image
                }
                Ok(None) => None,
                Err(e) => {
                    tracing::error!("Could not load advertisement {}: {}", id, e);
                    None
                }
            },
            None => None,
        };

        Artwork {
            header,
            primary_logo,
            secondary_logo,
            brand_logo: brand,
            advertisement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificates::PowerCart;
    use crate::documents::FsAssetStore;
    use crate::testing;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn service(fixture: &testing::Fixture) -> DocumentService {
        DocumentService::new(
            fixture.store.clone(),
            fixture.directory.clone(),
            Arc::new(FsAssetStore::new("./no-static", "./no-media")),
        )
    }

    fn view(template: CertificateTemplate) -> CertificateView {
        CertificateView {
            locale: Locale::En,
            code: "GCGA123456".into(),
            category: CertificateCategory::Default,
            template,
            headline: "18 Holes of Golf".into(),
            recipient_name: Some("Jane Doe".into()),
            message: "Enjoy 2 rounds".into(),
            restrictions: Some("Not valid on weekends".into()),
            expiry_date: NaiveDate::from_ymd_opt(2025, 10, 31),
            club_name: "Glen Abbey".into(),
            clubs: ClubListing::Clubs {
                primary: ClubBlock {
                    name: "Glen Abbey".into(),
                    address: Some("1333 Dorval Dr".into()),
                    city: Some("Oakville".into()),
                    state: Some("ON".into()),
                },
                secondary: None,
            },
            num_players: Some(2),
            num_nights: None,
            dollar_amount: None,
            redemption: Some(("Golf Shop".into(), "Call ahead".into())),
            artwork: Artwork::default(),
        }
    }

    #[test]
    fn test_every_template_renders_a_pdf() {
        for template in [
            CertificateTemplate::Default,
            CertificateTemplate::Ag30,
            CertificateTemplate::Prestige50,
            CertificateTemplate::GolfForLife,
        ] {
            let bytes = generate(&view(template)).unwrap();
            assert!(bytes.starts_with(b"%PDF"), "{:?} did not render", template);
        }
    }

    #[test]
    fn test_undecodable_artwork_is_skipped() {
        let mut view = view(CertificateTemplate::Default);
        view.artwork.advertisement = Some(b"not an image".to_vec());
        view.artwork.primary_logo = Some(Vec::new());
        assert!(generate(&view).unwrap().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_prepare_resolves_text_and_defaults() {
        let fixture = testing::fixture();
        let batch = fixture
            .create_batch(vec![fixture.new_certificate(
                fixture.default_type(),
                fixture.ontario_club(),
                dec!(2),
            )])
            .await;
        let certificate = fixture.store.certificates_for_batch(batch.id).await.unwrap().remove(0);

        let view = service(&fixture).prepare(&certificate, Some(&batch)).await.unwrap();

        assert_eq!(view.recipient_name.as_deref(), Some(batch.recipient_name.as_str()));
        assert_eq!(view.num_players, Some(2));
        assert_eq!(view.club_name, fixture.ontario_club().name);
        assert!(view.artwork.header.is_none());
        assert!(matches!(view.clubs, ClubListing::Clubs { secondary: None, .. }));
    }

    #[tokio::test]
    async fn test_merchandise_lists_clublink_wide() {
        let fixture = testing::fixture();
        let mut new_certificate =
            fixture.new_certificate(fixture.merchandise_type(), fixture.ontario_club(), dec!(50));
        new_certificate.power_cart = PowerCart::Included;
        let batch = fixture.create_batch(vec![new_certificate]).await;
        let certificate = fixture.store.certificates_for_batch(batch.id).await.unwrap().remove(0);

        let view = service(&fixture).prepare(&certificate, Some(&batch)).await.unwrap();
        assert_eq!(view.clubs, ClubListing::ClubLinkWide);
        assert_eq!(view.dollar_amount, Some(dec!(50.00)));
        assert_eq!(view.num_players, None);
    }

    #[tokio::test]
    async fn test_render_batch_names_files_after_club() {
        let fixture = testing::fixture();
        let batch = fixture
            .create_batch(vec![
                fixture.new_certificate(fixture.default_type(), fixture.ontario_club(), dec!(1)),
                fixture.new_certificate(fixture.default_type(), fixture.ontario_club(), dec!(4)),
            ])
            .await;

        let rendered = service(&fixture).render_batch(&batch).await.unwrap();
        assert_eq!(rendered.len(), 2);
        let prefix = fixture.ontario_club().name.replace(' ', "_");
        assert!(rendered[0].filename.starts_with(&prefix));
        assert!(rendered[0].filename.ends_with(".pdf"));
        assert!(rendered[1].bytes.starts_with(b"%PDF"));
    }
}
