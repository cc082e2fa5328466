//! Disease progression, spread and zone sections of the parameters file.

use crate::error::Result;
use crate::models::{
    AirborneSpread, DirectSpread, DiseaseProgression, DiseaseProgressionAssignment,
    DiseaseSpreadAssignment, IndirectSpread, Zone,
};
use crate::xml::Element;

use super::functions::{read_pdf, read_relational};
use super::{ContactType, ParameterReader};

impl ParameterReader<'_> {
    /// `disease-model` sections: the four in-unit period distributions and
    /// the optional within-unit prevalence chart.
    pub(crate) fn read_disease_models(&mut self, root: &Element) -> Result<()> {
        for el in root.deep_find_all("disease-model") {
            let latent = read_pdf(self.store, el.required("latent-period")?, &mut self.pdf_names)?;
            let subclinical = read_pdf(
                self.store,
                el.required("infectious-subclinical-period")?,
                &mut self.pdf_names,
            )?;
            let clinical = read_pdf(
                self.store,
                el.required("infectious-clinical-period")?,
                &mut self.pdf_names,
            )?;
            let immune = read_pdf(self.store, el.required("immunity-period")?, &mut self.pdf_names)?;
            let prevalence = match el.child("prevalence") {
                Some(chart) => {
                    let id = read_relational(self.store, chart, &mut self.rel_names)?;
                    if let Some(disease) = self.store.disease.as_mut() {
                        disease.use_within_unit_prevalence = true;
                    }
                    Some(id)
                }
                None => None,
            };

            for type_name in self.covered(el, "production-type") {
                let (progression, _) = self.store.progressions.merge_create(
                    Some(&format!("{type_name} Progression")),
                    DiseaseProgression {
                        name: String::new(),
                        disease_latent_period: latent,
                        disease_subclinical_period: subclinical,
                        disease_clinical_period: clinical,
                        disease_immune_period: immune,
                        disease_prevalence: prevalence,
                    },
                );
                let production_type = self.store.production_type_id(&type_name);
                self.store
                    .progression_assignments
                    .create_or_get(DiseaseProgressionAssignment {
                        production_type,
                        progression,
                    });
            }
        }
        Ok(())
    }

    /// `airborne-spread-model` and `airborne-spread-exponential-model`
    /// sections. Under exponential decay there is no distance cutoff, so the
    /// stored maximum distance is zero.
    pub(crate) fn read_airborne_models(&mut self, root: &Element) -> Result<()> {
        let sections = root
            .deep_find_all("airborne-spread-model")
            .chain(root.deep_find_all("airborne-spread-exponential-model"));
        for el in sections {
            let max_distance = if self.use_airborne_exponential_decay {
                0.0
            } else {
                el.required_f64("max-spread/value")?
            };
            let delay = match el.child("delay") {
                Some(delay) => Some(read_pdf(self.store, delay, &mut self.pdf_names)?),
                None => None,
            };
            let spread_1km_probability = el.required_f64("prob-spread-1km")?;
            let exposure_direction_start = el.required_f64("wind-direction-start/value")?;
            let exposure_direction_end = el.required_f64("wind-direction-end/value")?;

            for from_name in self.covered(el, "from-production-type") {
                for to_name in self.covered(el, "to-production-type") {
                    let (airborne, _) = self.store.airborne_spreads.merge_create(
                        Some(&format!("Airborne {from_name} -> {to_name}")),
                        AirborneSpread {
                            name: String::new(),
                            max_distance,
                            spread_1km_probability,
                            exposure_direction_start,
                            exposure_direction_end,
                            transport_delay: delay,
                        },
                    );
                    let source = self.store.production_type_id(&from_name);
                    let destination = self.store.production_type_id(&to_name);
                    let (pairing, _) = self
                        .store
                        .spread_assignments
                        .create_or_get(DiseaseSpreadAssignment::new(source, destination));
                    self.store.spread_assignments.get_mut(pairing).airborne_spread =
                        Some(airborne);
                }
            }
        }
        Ok(())
    }

    /// `zone-model` sections. A zero radius marks the background zone, which
    /// is implicit here and not stored.
    pub(crate) fn read_zone_models(&mut self, root: &Element) -> Result<()> {
        for el in root.deep_find_all("zone-model") {
            let name = el.required_text("name")?.to_string();
            let radius = el.required_f64("radius/value")?;
            if radius > 0.0 {
                self.store
                    .zones
                    .merge_create(Some(&name), Zone { name: String::new(), radius });
            }
        }
        Ok(())
    }

    /// Zone-free `contact-spread-model` sections, one spread record per
    /// (from, to) pair per route.
    pub(crate) fn read_contact_models(&mut self, root: &Element) -> Result<()> {
        for el in root.deep_find_all("contact-spread-model") {
            if el.attr("zone").is_some() {
                continue;
            }
            let contact_type = ContactType::required(el)?;
            let use_fixed_contact_rate = el.child("fixed-movement-rate").is_some();
            let contact_rate = if use_fixed_contact_rate {
                el.required_f64("fixed-movement-rate/value")?
            } else {
                el.required_f64("movement-rate/value")?
            };
            let distance = read_pdf(self.store, el.required("distance")?, &mut self.pdf_names)?;
            let delay = match el.child("delay") {
                Some(delay) => Some(read_pdf(self.store, delay, &mut self.pdf_names)?),
                None => None,
            };
            let infection_probability = el.optional_f64("prob-infect")?.unwrap_or(0.0);
            let latent_can_infect = el
                .child("latent-units-can-infect")
                .map_or(true, Element::bool_value);
            let subclinical_can_infect = el
                .child("subclinical-units-can-infect")
                .map_or(true, Element::bool_value);
            let movement_control =
                read_relational(self.store, el.required("movement-control")?, &mut self.rel_names)?;

            for from_name in self.covered(el, "from-production-type") {
                for to_name in self.covered(el, "to-production-type") {
                    let source = self.store.production_type_id(&from_name);
                    let destination = self.store.production_type_id(&to_name);
                    let (pairing, _) = self
                        .store
                        .spread_assignments
                        .create_or_get(DiseaseSpreadAssignment::new(source, destination));
                    match contact_type {
                        ContactType::Direct => {
                            let (spread, _) = self.store.direct_spreads.merge_create(
                                Some(&format!("Direct {from_name} -> {to_name}")),
                                DirectSpread {
                                    name: String::new(),
                                    use_fixed_contact_rate,
                                    contact_rate,
                                    movement_control,
                                    distance_distribution: distance,
                                    transport_delay: delay,
                                    infection_probability,
                                    latent_animals_can_infect_others: latent_can_infect,
                                    subclinical_animals_can_infect_others: subclinical_can_infect,
                                },
                            );
                            if let Some(disease) = self.store.disease.as_mut() {
                                disease.include_direct_contact_spread = true;
                            }
                            self.store
                                .spread_assignments
                                .get_mut(pairing)
                                .direct_contact_spread = Some(spread);
                        }
                        ContactType::Indirect => {
                            let (spread, _) = self.store.indirect_spreads.merge_create(
                                Some(&format!("Indirect {from_name} -> {to_name}")),
                                IndirectSpread {
                                    name: String::new(),
                                    use_fixed_contact_rate,
                                    contact_rate,
                                    movement_control,
                                    distance_distribution: distance,
                                    transport_delay: delay,
                                    infection_probability,
                                    subclinical_animals_can_infect_others: subclinical_can_infect,
                                },
                            );
                            if let Some(disease) = self.store.disease.as_mut() {
                                disease.include_indirect_contact_spread = true;
                            }
                            self.store
                                .spread_assignments
                                .get_mut(pairing)
                                .indirect_contact_spread = Some(spread);
                        }
                        ContactType::Both => unreachable!(),
                    }
                }
            }
        }
        Ok(())
    }

    /// `contact-spread-model` sections with a `zone` attribute: these do not
    /// describe spread, they attach movement controls to the zone's effect on
    /// each covered production type.
    pub(crate) fn read_zone_contact_models(&mut self, root: &Element) -> Result<()> {
        for el in root.deep_find_all("contact-spread-model") {
            let Some(zone_name) = el.attr("zone") else {
                continue;
            };
            let contact_type = ContactType::from_element(el)?;
            let zone = self.zone_named(zone_name)?;
            let movement_control =
                read_relational(self.store, el.required("movement-control")?, &mut self.rel_names)?;

            for type_name in self.covered(el, "from-production-type") {
                let production_type = self.store.production_type_id(&type_name);
                let effect = self.zone_effect_for(zone, production_type);
                let effect = self.store.zone_effects.get_mut(effect);
                if contact_type.includes_direct() {
                    effect.zone_direct_movement = Some(movement_control);
                }
                if contact_type.includes_indirect() {
                    effect.zone_indirect_movement = Some(movement_control);
                }
            }
        }
        Ok(())
    }
}
