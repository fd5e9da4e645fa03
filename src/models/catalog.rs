//! 静态对照表
//!
//! 省份列表、关键词分组、培训模式预设与 CPV 目录。

use serde::Serialize;

/// 省份
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Department {
    pub code: &'static str,
    pub name: &'static str,
}

/// CPV 目录条目
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CpvEntry {
    pub code: &'static str,
    pub domaine: &'static str,
    pub description: &'static str,
}

/// 关键词分组
#[derive(Debug, Clone, Copy, Serialize)]
pub struct KeywordBucket {
    pub name: &'static str,
    pub terms: &'static [&'static str],
}

/// 法兰西岛大区省份
pub const IDF_DEPARTEMENTS: &[Department] = &[
    Department { code: "75", name: "75 – Paris" },
    Department { code: "77", name: "77 – Seine-et-Marne" },
    Department { code: "78", name: "78 – Yvelines" },
    Department { code: "91", name: "91 – Essonne" },
    Department { code: "92", name: "92 – Hauts-de-Seine" },
    Department { code: "93", name: "93 – Seine-Saint-Denis" },
    Department { code: "94", name: "94 – Val-de-Marne" },
    Department { code: "95", name: "95 – Val d'Oise" },
];

pub const KEYWORD_BUCKETS: &[KeywordBucket] = &[
    KeywordBucket {
        name: "UX/UI",
        terms: &[
            "UX",
            "UI",
            "design d'interface",
            "recherche utilisateur",
            "prototypage",
            "Figma",
            "ergonomie",
        ],
    },
    KeywordBucket {
        name: "3D / Motion",
        terms: &["3D", "motion design", "animation", "After Effects", "Cinema 4D", "Blender"],
    },
    KeywordBucket {
        name: "Unity / Unreal",
        terms: &["Unity", "Unreal", "jeu vidéo", "temps réel", "VR", "AR", "XR"],
    },
    KeywordBucket {
        name: "IA créatives",
        terms: &[
            "intelligence artificielle",
            "IA générative",
            "Stable Diffusion",
            "Midjourney",
            "prompt",
            "création assistée",
        ],
    },
    KeywordBucket {
        name: "Data / BI",
        terms: &["data", "Power BI", "Excel avancé", "Tableau", "analyse de données", "visualisation"],
    },
    KeywordBucket {
        name: "Dev Web",
        terms: &["développement web", "JavaScript", "TypeScript", "React", "Next.js", "Node.js"],
    },
    KeywordBucket {
        name: "Marketing digital",
        terms: &["marketing digital", "SEO", "SEA", "social media", "campagnes", "automation"],
    },
    KeywordBucket {
        name: "Soft skills / Management",
        terms: &[
            "management",
            "prise de parole",
            "communication",
            "gestion de projet",
            "agilité",
            "scrum",
        ],
    },
];

/// 培训模式附加的全文关键词
pub const TRAINING_TERMS: &[&str] = &[
    "formation",
    "\"formation professionnelle\"",
    "apprentissage",
    "\"formation continue\"",
    "\"actions de formation\"",
];

/// 培训模式 CPV 白名单
pub const TRAINING_CPV_WHITELIST: &[&str] = &[
    "80500000",
    "80510000",
    "80533100",
    "80570000",
    "80000000",
    "80553000",
    "79632000",
    "79952000",
];

/// 培训模式服务类别（欧盟服务类别 24）
pub const TRAINING_SERVICE_CATEGORY: &str = "24";

pub const CPV_CATALOG: &[CpvEntry] = &[
    CpvEntry { code: "80500000", domaine: "Formation professionnelle", description: "Services de formation" },
    CpvEntry { code: "80510000", domaine: "Formation du personnel", description: "Services de formation spécialisés" },
    CpvEntry { code: "80533100", domaine: "Formation en informatique", description: "Formation en technologies de l’information" },
    CpvEntry { code: "80570000", domaine: "Formation continue", description: "Services de formation continue" },
    CpvEntry { code: "80000000", domaine: "Enseignement et formation", description: "Enseignement et formation générale" },
    CpvEntry { code: "80553000", domaine: "Formation à distance", description: "Formation à distance" },
    CpvEntry { code: "79632000", domaine: "Conseil en formation", description: "Services de formation et de conseil en gestion du personnel" },
    CpvEntry { code: "79952000", domaine: "Événements pédagogiques", description: "Organisation de séminaires / conférences" },
];

pub fn find_bucket(name: &str) -> Option<&'static KeywordBucket> {
    KEYWORD_BUCKETS.iter().find(|b| b.name == name)
}

/// 组合最终全文查询
///
/// 手动输入、所选分组的关键词、培训关键词之间以 ` OR ` 连接，空部分跳过。
/// 未知分组名被忽略。
pub fn compose_keywords(manual: &str, buckets: &[String], training: bool) -> String {
    let bucket_expr = buckets
        .iter()
        .filter_map(|name| find_bucket(name))
        .flat_map(|bucket| bucket.terms.iter())
        .filter(|term| !term.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" OR ");

    let training_expr = if training {
        TRAINING_TERMS.join(" OR ")
    } else {
        String::new()
    };

    [manual.to_string(), bucket_expr, training_expr]
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" OR ")
}
