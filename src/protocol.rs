//! Messages exchanged with the editor host.
//!
//! Both directions are JSON objects tagged by a `command` field. Delivery is
//! one message at a time with no correlation ids.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::error::HostError;
use crate::graph::{DisplayGraph, Graph, augment, build_graph};

/// Host -> panel.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Inbound {
	/// Replace the displayed graph with an already-built one.
	UpdateGraph { data: Graph },
	/// Replace the displayed graph with one built from raw report text.
	UpdateReport { report: String },
	/// The analyzer failed or produced nothing; keep the current graph.
	AnalysisFailed { message: String },
	Configure { layout: LayoutConfig },
}

/// Panel -> host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Outbound {
	Ready,
	Analyze,
	OpenFile {
		file: String,
		#[serde(skip_serializing_if = "Option::is_none")]
		line: Option<u32>,
	},
}

impl Inbound {
	pub fn from_json(text: &str) -> Result<Self, HostError> {
		serde_json::from_str(text).map_err(HostError::Decode)
	}
}

impl Outbound {
	/// Navigation intent; a line of 0 means "no particular line".
	pub fn open_file(file: impl Into<String>, line: Option<u32>) -> Self {
		Outbound::OpenFile {
			file: file.into(),
			line: line.filter(|&n| n > 0),
		}
	}

	pub fn to_json(&self) -> Result<String, HostError> {
		serde_json::to_string(self).map_err(HostError::Encode)
	}
}

/// What the panel should do with an inbound message.
#[derive(Clone, Debug, PartialEq)]
pub enum PanelUpdate {
	Show(DisplayGraph),
	Notify(String),
	Reconfigure(LayoutConfig),
}

pub fn dispatch<R: Rng>(message: Inbound, config: &LayoutConfig, rng: &mut R) -> PanelUpdate {
	match message {
		Inbound::UpdateGraph { data } => PanelUpdate::Show(augment(data, config, rng)),
		Inbound::UpdateReport { report } => {
			PanelUpdate::Show(augment(build_graph(&report), config, rng))
		}
		Inbound::AnalysisFailed { message } => PanelUpdate::Notify(message),
		Inbound::Configure { layout } => PanelUpdate::Reconfigure(layout.sanitized()),
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	use super::*;
	use crate::components::force_graph::ForceGraphState;
	use crate::graph::NodeKind;

	#[test]
	fn decodes_update_graph() {
		let msg = Inbound::from_json(
			r#"{"command":"updateGraph","data":{"nodes":[
				{"id":"blog:v.py:A","name":"A","type":"class","file":"v.py","app":"blog"}
			],"links":[]}}"#,
		)
		.unwrap();
		let Inbound::UpdateGraph { data } = msg else {
			panic!("wrong variant: {msg:?}");
		};
		assert_eq!(data.nodes[0].kind, NodeKind::Class);
	}

	#[test]
	fn unknown_commands_are_decode_errors() {
		assert!(matches!(
			Inbound::from_json(r#"{"command":"selfDestruct"}"#),
			Err(HostError::Decode(_))
		));
		assert!(Inbound::from_json("not json").is_err());
	}

	#[test]
	fn outbound_wire_shapes() {
		assert_eq!(Outbound::Analyze.to_json().unwrap(), r#"{"command":"analyze"}"#);
		assert_eq!(
			Outbound::open_file("blog/views.py", Some(12)).to_json().unwrap(),
			r#"{"command":"openFile","file":"blog/views.py","line":12}"#
		);
		assert_eq!(
			Outbound::open_file("blog/views.py", Some(0)).to_json().unwrap(),
			r#"{"command":"openFile","file":"blog/views.py"}"#
		);
	}

	#[test]
	fn report_messages_build_then_augment() {
		let msg = Inbound::from_json(
			r#"{"command":"updateReport","report":"app blog\nfile v.py\nclass A\n"}"#,
		)
		.unwrap();
		let update = dispatch(msg, &LayoutConfig::default(), &mut StdRng::seed_from_u64(1));
		let PanelUpdate::Show(display) = update else {
			panic!("expected a graph");
		};
		let kinds: Vec<NodeKind> = display.nodes.iter().map(|s| s.node.kind).collect();
		assert_eq!(kinds, vec![NodeKind::Group, NodeKind::Class]);
	}

	#[test]
	fn failures_and_config_do_not_touch_the_graph() {
		let mut rng = StdRng::seed_from_u64(1);
		let config = LayoutConfig::default();
		let failed = Inbound::from_json(r#"{"command":"analysisFailed","message":"no output"}"#)
			.unwrap();
		assert_eq!(
			dispatch(failed, &config, &mut rng),
			PanelUpdate::Notify("no output".into())
		);
		let configure =
			Inbound::from_json(r#"{"command":"configure","layout":{"maxZoom":4}}"#).unwrap();
		let PanelUpdate::Reconfigure(layout) = dispatch(configure, &config, &mut rng) else {
			panic!("expected a config");
		};
		assert_eq!(layout.max_zoom, 4.0);
	}

	#[test]
	fn hostile_layout_cannot_break_zoom_or_seeding() {
		let mut rng = StdRng::seed_from_u64(3);
		let configure = Inbound::from_json(
			r#"{"command":"configure","layout":{"minZoom":5,"maxZoom":1,"jitter":1e308}}"#,
		)
		.unwrap();
		let PanelUpdate::Reconfigure(layout) =
			dispatch(configure, &LayoutConfig::default(), &mut rng)
		else {
			panic!("expected a config");
		};
		assert!(layout.min_zoom <= layout.max_zoom);

		let mut state = ForceGraphState::new(LayoutConfig::default(), 800.0, 600.0);
		state.set_config(layout.clone());
		state.zoom_at(400.0, 300.0, -1.0);
		assert!((1.0..=5.0).contains(&state.transform.k));

		let report = Inbound::from_json(
			r#"{"command":"updateReport","report":"app blog\nfile v.py\nclass A\n"}"#,
		)
		.unwrap();
		let PanelUpdate::Show(display) = dispatch(report, &layout, &mut rng) else {
			panic!("expected a graph");
		};
		assert!(display.nodes.iter().all(|s| s.x.is_finite() && s.y.is_finite()));
	}
}
