//! Detection, tracing, vaccination, destruction, resource and cost sections
//! of the parameters file.
//!
//! Every section resolves its covered production types and then touches only
//! the protocol fields it owns. Priority numbers are accumulated into the
//! reader's order lists and resolved once the resources section is reached.

use log::warn;

use crate::error::{ParseError, Result};
use crate::models::DiseaseDetection;
use crate::xml::Element;

use super::functions::{read_pdf, read_relational};
use super::{ContactType, Direction, ParameterReader};

impl ParameterReader<'_> {
    /// `detection-model` sections. The zone-attributed form carries a
    /// multiplier on the probability of observing clinical signs inside the
    /// zone; the plain form carries the two reporting charts.
    pub(crate) fn read_detection_models(&mut self, root: &Element) -> Result<()> {
        for el in root.deep_find_all("detection-model") {
            if let Some(zone_name) = el.attr("zone") {
                let multiplier = el.required_f64("zone-prob-multiplier")?;
                let zone = self.zone_named(zone_name)?;
                for type_name in self.covered(el, "production-type") {
                    let production_type = self.store.production_type_id(&type_name);
                    let effect = self.zone_effect_for(zone, production_type);
                    self.store.zone_effects.get_mut(effect).zone_detection_multiplier =
                        Some(multiplier);
                }
            } else {
                let observing = read_relational(
                    self.store,
                    el.required("prob-report-vs-time-clinical")?,
                    &mut self.rel_names,
                )?;
                let reporting = read_relational(
                    self.store,
                    el.required("prob-report-vs-time-since-outbreak")?,
                    &mut self.rel_names,
                )?;
                for type_name in self.covered(el, "production-type") {
                    let protocol = self.protocol_for(&type_name);
                    let protocol = self.store.protocols.get_mut(protocol);
                    protocol.use_detection = true;
                    protocol.detection_probability_for_observed_time_in_clinical =
                        Some(observing);
                    protocol.detection_probability_report_vs_first_detection = Some(reporting);
                }
            }
        }
        Ok(())
    }

    /// `contact-recorder-model` sections: trace success rates and the result
    /// delay. The direction attribute is validated but does not select any
    /// field here.
    pub(crate) fn read_contact_recorder_models(&mut self, root: &Element) -> Result<()> {
        for el in root.deep_find_all("contact-recorder-model") {
            let contact_type = ContactType::from_element(el)?;
            Direction::from_element(el)?;
            let trace_success = el.required_f64("trace-success")?;
            let trace_delay = match el.child("trace-delay") {
                Some(delay) => Some(read_pdf(self.store, delay, &mut self.pdf_names)?),
                None => None,
            };
            for type_name in self.covered(el, "production-type") {
                let protocol = self.protocol_for(&type_name);
                let protocol = self.store.protocols.get_mut(protocol);
                if contact_type.includes_direct() {
                    protocol.direct_trace_success_rate = Some(trace_success);
                }
                if contact_type.includes_indirect() {
                    protocol.indirect_trace_success = Some(trace_success);
                }
                protocol.trace_result_delay = trace_delay;
            }
        }
        Ok(())
    }

    /// `trace-model` sections: which trace kinds run and how far back.
    pub(crate) fn read_trace_models(&mut self, root: &Element) -> Result<()> {
        for el in root.deep_find_all("trace-model") {
            let contact_type = ContactType::from_element(el)?;
            let direction = Direction::from_element(el)?;
            let trace_period = el.required_i32("trace-period/value")?;
            for type_name in self.covered(el, "production-type") {
                let protocol = self.protocol_for(&type_name);
                let protocol = self.store.protocols.get_mut(protocol);
                protocol.use_tracing = true;
                if contact_type.includes_direct() {
                    if direction.outgoing() {
                        protocol.trace_direct_forward = true;
                    }
                    if direction.incoming() {
                        protocol.trace_direct_back = true;
                    }
                    protocol.direct_trace_period = Some(trace_period);
                }
                if contact_type.includes_indirect() {
                    if direction.outgoing() {
                        protocol.trace_indirect_forward = true;
                    }
                    if direction.incoming() {
                        protocol.trace_indirect_back = true;
                    }
                    protocol.indirect_trace_period = Some(trace_period);
                }
            }
        }
        Ok(())
    }

    /// `trace-exam-model` sections: herd exams on traced units, fanned out
    /// over the contact-type and direction attributes.
    pub(crate) fn read_trace_exam_models(&mut self, root: &Element) -> Result<()> {
        for el in root.deep_find_all("trace-exam-model") {
            let contact_type = ContactType::from_element(el)?;
            let direction = Direction::from_element(el)?;
            let multiplier = el.required_f64("detection-multiplier")?;
            let test_if_no_signs = el
                .child("test-if-no-signs")
                .map_or(false, Element::bool_value);
            for type_name in self.covered(el, "production-type") {
                let protocol = self.protocol_for(&type_name);
                let protocol = self.store.protocols.get_mut(protocol);
                protocol.use_exams = true;
                if contact_type.includes_direct() {
                    if direction.outgoing() {
                        protocol.examine_direct_forward_traces = true;
                        protocol.exam_direct_forward_success_multiplier = Some(multiplier);
                        protocol.test_direct_forward_traces = test_if_no_signs;
                    }
                    if direction.incoming() {
                        protocol.examine_direct_back_traces = true;
                        protocol.exam_direct_back_success_multiplier = Some(multiplier);
                        protocol.test_direct_back_traces = test_if_no_signs;
                    }
                }
                if contact_type.includes_indirect() {
                    if direction.outgoing() {
                        protocol.examine_indirect_forward_traces = true;
                        protocol.exam_indirect_forward_success_multiplier = Some(multiplier);
                        protocol.test_indirect_forward_traces = test_if_no_signs;
                    }
                    if direction.incoming() {
                        protocol.examine_indirect_back_traces = true;
                        protocol.exam_indirect_back_success_multiplier = Some(multiplier);
                        protocol.test_indirect_back_traces = test_if_no_signs;
                    }
                }
            }
        }
        Ok(())
    }

    /// `test-model` sections: diagnostic test characteristics.
    pub(crate) fn read_test_models(&mut self, root: &Element) -> Result<()> {
        for el in root.deep_find_all("test-model") {
            let sensitivity = el.required_f64("sensitivity")?;
            let specificity = el.required_f64("specificity")?;
            let delay = read_pdf(self.store, el.required("delay")?, &mut self.pdf_names)?;
            for type_name in self.covered(el, "production-type") {
                let protocol = self.protocol_for(&type_name);
                let protocol = self.store.protocols.get_mut(protocol);
                protocol.use_testing = true;
                protocol.test_sensitivity = Some(sensitivity);
                protocol.test_specificity = Some(specificity);
                protocol.test_delay = Some(delay);
            }
        }
        Ok(())
    }

    /// `basic-zone-focus-model` sections: detection triggers a zone focus.
    pub(crate) fn read_basic_zone_focus_models(&mut self, root: &Element) -> Result<()> {
        for el in root.deep_find_all("basic-zone-focus-model") {
            for type_name in self.covered(el, "production-type") {
                let protocol = self.protocol_for(&type_name);
                self.store.protocols.get_mut(protocol).detection_is_a_zone_trigger = true;
            }
        }
        Ok(())
    }

    /// `trace-back-zone-focus-model` (the older module) and
    /// `trace-zone-focus-model` sections: a trace triggers a zone focus.
    pub(crate) fn read_trace_zone_focus_models(&mut self, root: &Element) -> Result<()> {
        let sections: Vec<&Element> = root
            .deep_find_all("trace-back-zone-focus-model")
            .chain(root.deep_find_all("trace-zone-focus-model"))
            .collect();
        for el in sections {
            let contact_type = ContactType::from_element(el)?;
            for type_name in self.covered(el, "production-type") {
                let protocol = self.protocol_for(&type_name);
                let protocol = self.store.protocols.get_mut(protocol);
                protocol.use_tracing = true;
                if contact_type.includes_direct() {
                    protocol.direct_trace_is_a_zone_trigger = true;
                }
                if contact_type.includes_indirect() {
                    protocol.indirect_trace_is_a_zone_trigger = true;
                }
            }
        }
        Ok(())
    }

    /// `vaccine-model` sections: vaccine effects per production type.
    pub(crate) fn read_vaccine_models(&mut self, root: &Element) -> Result<()> {
        for el in root.deep_find_all("vaccine-model") {
            let delay = el.required_i32("delay/value")?;
            let immunity_period =
                read_pdf(self.store, el.required("immunity-period")?, &mut self.pdf_names)?;
            for type_name in self.covered(el, "production-type") {
                let protocol = self.protocol_for(&type_name);
                let protocol = self.store.protocols.get_mut(protocol);
                protocol.days_to_immunity = Some(delay);
                protocol.vaccine_immune_period = Some(immunity_period);
                self.vaccine_effects_defined.insert(type_name);
            }
        }
        Ok(())
    }

    /// `ring-vaccination-model` sections. Older files carry only a
    /// `production-type` attribute, which means any detection triggers a ring
    /// around it and the named types are the targets.
    pub(crate) fn read_ring_vaccination_models(&mut self, root: &Element) -> Result<()> {
        for el in root.deep_find_all("ring-vaccination-model") {
            let (from_names, to_names) = if el.attr("production-type").is_some() {
                (
                    self.type_names.iter().cloned().collect(),
                    self.covered(el, "production-type"),
                )
            } else {
                (
                    self.covered(el, "from-production-type"),
                    self.covered(el, "to-production-type"),
                )
            };

            let radius = el.required_f64("radius/value")?;
            for from_name in from_names {
                let protocol = self.protocol_for(&from_name);
                let protocol = self.store.protocols.get_mut(protocol);
                protocol.trigger_vaccination_ring = true;
                protocol.vaccination_ring_radius = Some(radius);
            }

            let priority = el.required_i32("priority")?;
            let min_time_between = el.required_i32("min-time-between-vaccinations/value")?;
            let vaccinate_detected = el
                .child("vaccinate-detected-units")
                .map_or(true, Element::bool_value);
            for to_name in to_names {
                let protocol = self.protocol_for(&to_name);
                let protocol = self.store.protocols.get_mut(protocol);
                protocol.use_vaccination = true;
                protocol.minimum_time_between_vaccinations = Some(min_time_between);
                protocol.vaccinate_detected_units = vaccinate_detected;
                self.vaccination_type_order.observe(priority, &to_name);
                self.vaccinated.insert(to_name);
            }
        }
        Ok(())
    }

    /// Every vaccinated production type must have vaccine effects defined;
    /// the reverse is legal but almost certainly a scenario-authoring slip.
    pub(crate) fn check_vaccination_coverage(&self) -> Result<()> {
        let missing: Vec<&str> = self
            .vaccinated
            .difference(&self.vaccine_effects_defined)
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(ParseError::VaccineEffectsMissing(missing.join(", ")));
        }
        if self.vaccinated != self.vaccine_effects_defined {
            warn!(
                "mismatch between production types that are vaccinated and production types \
                 that have vaccine effects defined"
            );
        }
        Ok(())
    }

    /// `trace-back-destruction-model` sections (the older module). The first
    /// half enables forward tracing from every known production type; the
    /// second half marks the covered types for destruction unless the section
    /// is quarantine-only.
    pub(crate) fn read_trace_back_destruction_models(&mut self, root: &Element) -> Result<()> {
        for el in root.deep_find_all("trace-back-destruction-model") {
            let contact_type = ContactType::required(el)?;
            let trace_period = el.required_i32("trace-period/value")?;
            let trace_success = el.required_f64("trace-success")?;
            for type_name in self.type_names.clone() {
                let protocol = self.protocol_for(&type_name);
                let protocol = self.store.protocols.get_mut(protocol);
                protocol.use_tracing = true;
                match contact_type {
                    ContactType::Direct => {
                        protocol.trace_direct_forward = true;
                        protocol.direct_trace_success_rate = Some(trace_success);
                        protocol.direct_trace_period = Some(trace_period);
                    }
                    ContactType::Indirect => {
                        protocol.trace_indirect_forward = true;
                        protocol.indirect_trace_success = Some(trace_success);
                        protocol.indirect_trace_period = Some(trace_period);
                    }
                    ContactType::Both => unreachable!(),
                }
            }

            let priority = el.required_i32("priority")?;
            let quarantine_only = el
                .child("quarantine-only")
                .map_or(false, Element::bool_value);
            if quarantine_only {
                continue;
            }
            let reason = match contact_type {
                ContactType::Direct => "Trace fwd direct",
                _ => "Trace fwd indirect",
            };
            for type_name in self.covered(el, "production-type") {
                let protocol = self.protocol_for(&type_name);
                let protocol = self.store.protocols.get_mut(protocol);
                match contact_type {
                    ContactType::Direct => protocol.destroy_direct_forward_traces = true,
                    _ => protocol.destroy_indirect_forward_traces = true,
                }
                self.destruction_reason_order.observe(priority, reason);
                self.destruction_type_order.observe(priority, &type_name);
            }
        }
        Ok(())
    }

    /// `basic-destruction-model` sections: detected units of the covered
    /// types are destroyed.
    pub(crate) fn read_basic_destruction_models(&mut self, root: &Element) -> Result<()> {
        for el in root.deep_find_all("basic-destruction-model") {
            let priority = el.required_i32("priority")?;
            for type_name in self.covered(el, "production-type") {
                let protocol = self.protocol_for(&type_name);
                self.store.protocols.get_mut(protocol).use_destruction = true;
                self.destruction_reason_order.observe(priority, "Basic");
                self.destruction_type_order.observe(priority, &type_name);
            }
        }
        Ok(())
    }

    /// `trace-destruction-model` sections: traced units are destroyed,
    /// fanned out over the contact-type and direction attributes.
    pub(crate) fn read_trace_destruction_models(&mut self, root: &Element) -> Result<()> {
        for el in root.deep_find_all("trace-destruction-model") {
            let contact_type = ContactType::from_element(el)?;
            let direction = Direction::from_element(el)?;
            let priority = el.required_i32("priority")?;
            for type_name in self.covered(el, "production-type") {
                let protocol = self.protocol_for(&type_name);
                let protocol = self.store.protocols.get_mut(protocol);
                if contact_type.includes_direct() {
                    if direction.outgoing() {
                        protocol.destroy_direct_forward_traces = true;
                        self.destruction_reason_order.observe(priority, "Trace fwd direct");
                    }
                    if direction.incoming() {
                        protocol.destroy_direct_back_traces = true;
                        self.destruction_reason_order.observe(priority, "Trace back direct");
                    }
                }
                if contact_type.includes_indirect() {
                    if direction.outgoing() {
                        protocol.destroy_indirect_forward_traces = true;
                        self.destruction_reason_order
                            .observe(priority, "Trace fwd indirect");
                    }
                    if direction.incoming() {
                        protocol.destroy_indirect_back_traces = true;
                        self.destruction_reason_order
                            .observe(priority, "Trace back indirect");
                    }
                }
                self.destruction_type_order.observe(priority, &type_name);
            }
        }
        Ok(())
    }

    /// `ring-destruction-model` sections, with the same older attribute form
    /// as ring vaccination.
    pub(crate) fn read_ring_destruction_models(&mut self, root: &Element) -> Result<()> {
        for el in root.deep_find_all("ring-destruction-model") {
            let (from_names, to_names) = if el.attr("production-type").is_some() {
                (
                    self.type_names.iter().cloned().collect(),
                    self.covered(el, "production-type"),
                )
            } else {
                (
                    self.covered(el, "from-production-type"),
                    self.covered(el, "to-production-type"),
                )
            };

            let radius = el.required_f64("radius/value")?;
            for from_name in from_names {
                let protocol = self.protocol_for(&from_name);
                let protocol = self.store.protocols.get_mut(protocol);
                protocol.destruction_is_a_ring_trigger = true;
                protocol.destruction_ring_radius = Some(radius);
            }

            let priority = el.required_i32("priority")?;
            for to_name in to_names {
                let protocol = self.protocol_for(&to_name);
                self.store.protocols.get_mut(protocol).destruction_is_a_ring_target = true;
                self.destruction_reason_order.observe(priority, "Ring");
                self.destruction_type_order.observe(priority, &to_name);
            }
        }
        Ok(())
    }

    /// `resources-and-implementation-of-controls-model` sections: capacity
    /// curves, program delays and the resolved priority orders.
    pub(crate) fn read_resources_models(&mut self, root: &Element) -> Result<()> {
        for el in root.deep_find_all("resources-and-implementation-of-controls-model") {
            if self.use_destruction {
                let program_delay = el.required_i32("destruction-program-delay/value")?;
                let capacity = read_relational(
                    self.store,
                    el.required("destruction-capacity")?,
                    &mut self.rel_names,
                )?;
                // Older files omit the order text. The XML never put spaces
                // after the commas but the stored form does.
                let order = el
                    .find("destruction-priority-order")
                    .map(|n| n.text.trim())
                    .filter(|t| !t.is_empty())
                    .unwrap_or("reason,production type,time waiting");
                let order = order.split(',').collect::<Vec<_>>().join(", ");

                let reason_order = self.destruction_reason_order.order_string();
                let ranked_types = self.destruction_type_order.ranked();
                for (rank, type_name) in ranked_types.iter().enumerate() {
                    let protocol = self.protocol_for(type_name);
                    self.store.protocols.get_mut(protocol).destruction_priority =
                        Some(rank as i32 + 1);
                }

                if let Some(plan) = self.store.master_plan.as_mut() {
                    plan.destruction_program_delay = Some(program_delay);
                    plan.destruction_capacity = Some(capacity);
                    plan.destruction_priority_order = order;
                    plan.destruction_reason_order = reason_order;
                }
            }

            if self.use_vaccination {
                let units_detected = el
                    .optional_i32("vaccination-program-delay")?
                    .map_or(1, |v| v.max(1));
                self.store.vaccination_trigger = Some(DiseaseDetection {
                    number_of_units: units_detected,
                });
                let capacity = read_relational(
                    self.store,
                    el.required("vaccination-capacity")?,
                    &mut self.rel_names,
                )?;
                let order = el.required_text("vaccination-priority-order")?.trim();
                let order = order.split(',').collect::<Vec<_>>().join(", ");

                let ranked_types = self.vaccination_type_order.ranked();
                for (rank, type_name) in ranked_types.iter().enumerate() {
                    let protocol = self.protocol_for(type_name);
                    self.store.protocols.get_mut(protocol).vaccination_priority =
                        Some(rank as i32 + 1);
                }

                if let Some(plan) = self.store.master_plan.as_mut() {
                    plan.vaccination_capacity = Some(capacity);
                    plan.vaccination_priority_order = order;
                }
            }
        }
        Ok(())
    }

    /// `economic-model` sections: per-type cost parameters, plus the zone
    /// surveillance cost on the zone effect when the section names a zone.
    pub(crate) fn read_economic_models(&mut self, root: &Element) -> Result<()> {
        for el in root.deep_find_all("economic-model") {
            let vaccination_fixed = el.optional_f64("vaccination-fixed/value")?;
            let vaccination_base = el.optional_f64("vaccination/value")?;
            let vaccination_extra = el.optional_f64("additional-vaccination/value")?;
            let baseline_capacity = el.optional_i32("baseline-vaccination-capacity")?;
            let appraisal = el.optional_f64("appraisal/value")?;
            let euthanasia = el.optional_f64("euthanasia/value")?;
            let indemnification = el.optional_f64("indemnification/value")?;
            let disposal = el.optional_f64("carcass-disposal/value")?;
            let cleaning = el.optional_f64("cleaning-disinfecting/value")?;
            let surveillance = el.optional_f64("surveillance/value")?;

            for type_name in self.covered(el, "production-type") {
                let protocol = self.protocol_for(&type_name);
                let protocol = self.store.protocols.get_mut(protocol);
                protocol.use_cost_accounting = true;
                if vaccination_fixed.is_some() {
                    protocol.cost_of_vaccination_setup_per_unit = vaccination_fixed;
                }
                if vaccination_base.is_some() {
                    protocol.cost_of_vaccination_baseline_per_animal = vaccination_base;
                }
                if vaccination_extra.is_some() {
                    protocol.cost_of_vaccination_additional_per_animal = vaccination_extra;
                }
                if baseline_capacity.is_some() {
                    protocol.vaccination_demand_threshold = baseline_capacity;
                }
                if appraisal.is_some() {
                    protocol.cost_of_destruction_appraisal_per_unit = appraisal;
                }
                if euthanasia.is_some() {
                    protocol.cost_of_euthanasia_per_animal = euthanasia;
                }
                if indemnification.is_some() {
                    protocol.cost_of_indemnification_per_animal = indemnification;
                }
                if disposal.is_some() {
                    protocol.cost_of_carcass_disposal_per_animal = disposal;
                }
                if cleaning.is_some() {
                    protocol.cost_of_destruction_cleaning_per_unit = cleaning;
                }

                if let (Some(zone_name), Some(cost)) = (el.attr("zone"), surveillance) {
                    let zone = self.zone_named(zone_name)?;
                    let production_type = self.store.production_type_id(&type_name);
                    let effect = self.zone_effect_for(zone, production_type);
                    self.store
                        .zone_effects
                        .get_mut(effect)
                        .cost_of_surveillance_per_animal_day = Some(cost);
                }
            }
        }
        Ok(())
    }
}
