//! Presentation layer: projects the engine result into the JSON shape the
//! API serves, with Chinese field labels. The engine always computes the
//! full result; `options` only selects which sections are forwarded.

use bazi_core::{annual_cycles, BirthChart, FortuneCycles, TenGod};
use serde_json::{json, Value};

/// Which sections of the result the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Options {
    Basic,
    Wuxing,
    Fortune,
    #[default]
    All,
}

impl Options {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "basic" => Some(Self::Basic),
            "wuxing" => Some(Self::Wuxing),
            "fortune" => Some(Self::Fortune),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

const PILLAR_LABELS: [&str; 4] = ["年柱", "月柱", "日柱", "时柱"];
const ELEMENT_LABELS: [&str; 5] = ["木", "火", "土", "金", "水"];

fn bazi_section(chart: &BirthChart) -> Value {
    let mut pillars = serde_json::Map::new();
    for (label, p) in PILLAR_LABELS.iter().zip(chart.pillars.iter()) {
        pillars.insert(
            label.to_string(),
            json!({
                "天干": p.ganzhi.stem().zh(),
                "地支": p.ganzhi.branch().zh(),
                "干支": p.ganzhi.name(),
            }),
        );
    }
    Value::Object(pillars)
}

fn na_yin_section(chart: &BirthChart) -> Value {
    let mut out = serde_json::Map::new();
    for (label, p) in PILLAR_LABELS.iter().zip(chart.pillars.iter()) {
        out.insert(label.to_string(), json!(p.na_yin()));
    }
    Value::Object(out)
}

fn shi_shen_section(chart: &BirthChart) -> Value {
    let mut out = serde_json::Map::new();
    for (label, p) in PILLAR_LABELS.iter().zip(chart.pillars.iter()) {
        out.insert(
            label.to_string(),
            json!({
                // The day pillar's stem is the reference point itself.
                "天干": p.stem_god.map(TenGod::zh).unwrap_or("日主"),
                "地支": p.branch_god.zh(),
            }),
        );
    }
    Value::Object(out)
}

fn wu_xing_section(chart: &BirthChart) -> Value {
    let mut detail = serde_json::Map::new();
    for (label, p) in PILLAR_LABELS.iter().zip(chart.pillars.iter()) {
        detail.insert(
            label.to_string(),
            json!({
                "天干": p.ganzhi.stem().element().zh(),
                "地支": p.ganzhi.branch().element().zh(),
            }),
        );
    }
    let list: Vec<&str> = chart.elements().iter().map(|e| e.zh()).collect();
    let mut counts = serde_json::Map::new();
    for (label, n) in ELEMENT_LABELS.iter().zip(chart.element_counts().iter()) {
        counts.insert(label.to_string(), json!(n));
    }
    json!({
        "明细": Value::Object(detail),
        "列表": list,
        "统计": Value::Object(counts),
    })
}

fn fortune_section(fortune: &FortuneCycles) -> Value {
    let da_yun: Vec<Value> = fortune
        .decennial
        .iter()
        .map(|c| {
            json!({
                "序号": c.index,
                "大运干支": c.ganzhi.map(|g| g.name()).unwrap_or_else(|| "起运前".to_string()),
                "起运年份": c.start_year,
                "起运年龄": c.start_age,
                "结束年龄": c.end_age,
            })
        })
        .collect();
    // Annual detail for the first completed decade.
    let liu_nian: Vec<Value> = annual_cycles(&fortune.decennial[1])
        .iter()
        .map(|y| {
            json!({
                "序号": y.index,
                "年份": y.year,
                "年龄": y.age,
                "干支": y.ganzhi.name(),
            })
        })
        .collect();
    json!({
        "起运": {
            "年数": fortune.onset.years,
            "月数": fortune.onset.months,
            "天数": fortune.onset.days,
            "方向": fortune.direction.zh(),
            "描述": fortune.onset.describe(),
        },
        "da_yun": da_yun,
        "liu_nian": liu_nian,
    })
}

fn user_info(chart: &BirthChart) -> Value {
    let i = &chart.input;
    json!({
        "阳历": format!(
            "{:04}-{:02}-{:02} {:02}:{:02}",
            i.year, i.month, i.day, i.hour, i.minute
        ),
        "农历": chart.lunar.zh(),
        "生肖": chart.zodiac(),
        "性别": i.gender.zh(),
    })
}

/// Assembles the response body for one request. Each non-`all` option is an
/// exclusive slice of the full result.
pub fn project(options: Options, chart: &BirthChart, fortune: &FortuneCycles) -> Value {
    let mut body = serde_json::Map::new();
    if matches!(options, Options::Basic | Options::All) {
        body.insert("八字".to_string(), bazi_section(chart));
        body.insert(
            "day_master".to_string(),
            json!({
                "天干": chart.day_master().zh(),
                "五行": chart.day_master().element().zh(),
            }),
        );
        body.insert("user_info".to_string(), user_info(chart));
    }
    if matches!(options, Options::All) {
        body.insert("十神".to_string(), shi_shen_section(chart));
    }
    if matches!(options, Options::Wuxing | Options::All) {
        body.insert("五行".to_string(), wu_xing_section(chart));
        body.insert("纳音".to_string(), na_yin_section(chart));
    }
    if matches!(options, Options::Fortune | Options::All) {
        body.insert("fortune".to_string(), fortune_section(fortune));
    }
    Value::Object(body)
}
