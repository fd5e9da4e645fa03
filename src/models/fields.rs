//! 字段解析
//!
//! 不同部署/版本的 BOAMP 数据集列名并不一致。每个语义槽位维护一张有序的候选
//! 列名表，按顺序取第一个在数据集结构中出现的列；都不存在时使用默认列名。

use serde::{Deserialize, Serialize};

use crate::models::schema::DatasetSchema;

/// 语义槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldSlot {
    Date,
    Title,
    Url,
    Cpv,
    Dept,
    Buyer,
    Description,
    Reference,
    ServiceCategory,
    Nature,
    Deadline,
    BuyerAddress,
    Budget,
    Procedure,
    MarketType,
    Place,
}

/// 槽位 → (候选列名, 默认列名)
///
/// 候选顺序即优先级。
const FIELD_CANDIDATES: &[(FieldSlot, &[&str], &str)] = &[
    (
        FieldSlot::Date,
        &[
            "dateparution",
            "date_publication",
            "datepublication",
            "date",
            "publication_date",
            "record_timestamp",
        ],
        "record_timestamp",
    ),
    (
        FieldSlot::Title,
        &["intitule", "objet", "titre", "title", "intitulé", "objet_du_marche"],
        "title",
    ),
    (
        FieldSlot::Url,
        &[
            "url",
            "lien",
            "pageurl",
            "url_avis",
            "url_detail_avis",
            "avis_url",
            "link",
            "permalink",
            "permalien",
            "permalink_avis",
            "permalien_avis",
        ],
        "permalink",
    ),
    (
        FieldSlot::Cpv,
        &["cpv", "cpvs", "code_cpv", "codes_cpv", "cpv_principal"],
        "cpv",
    ),
    (
        FieldSlot::Dept,
        &[
            "lieu_execution_code",
            "code_departement",
            "departement",
            "code_dept",
            "dept",
            "code_insee_departement",
        ],
        "departement",
    ),
    (
        FieldSlot::Buyer,
        &[
            "acheteur",
            "acheteur_nom",
            "acheteur_name",
            "organisme",
            "acheteur.principal",
        ],
        "acheteur",
    ),
    (
        FieldSlot::Description,
        &["description", "objet", "objet_detail", "objetcomplet", "texte"],
        "description",
    ),
    (
        FieldSlot::Reference,
        &[
            "reference",
            "référence",
            "numero",
            "num_avis",
            "identifiant",
            "no_avis",
            "num_annonce",
            "id",
            "recordid",
        ],
        "id",
    ),
    (
        FieldSlot::ServiceCategory,
        &[
            "categorie_services",
            "categorie_service",
            "categorie",
            "categorie_de_services",
            "category_service",
            "service_category",
        ],
        "categorie_services",
    ),
    (
        FieldSlot::Nature,
        &["nature", "nature_avis", "type_avis", "type", "etat", "etat_avis"],
        "nature",
    ),
    (
        FieldSlot::Deadline,
        &[
            "date_limite_remise_offres",
            "date_limite_de_reception_des_offres",
            "date_limite_offres",
            "date_reception_offres",
            "date_reponse",
            "date_limite",
            "date_depot_offre",
            "deadline",
        ],
        "date_limite_remise_offres",
    ),
    (
        FieldSlot::BuyerAddress,
        &[
            "nom_et_adresse_officiels_de_l_organisme_acheteur",
            "nom_et_adresse_officiels_de_lorganisme_acheteur",
            "acheteur_adresse",
            "adresse_acheteur",
            "organisme_adresse",
            "acheteur_coordonnees",
            "coordonnees_acheteur",
            "adresse",
        ],
        "nom_et_adresse_officiels_de_l_organisme_acheteur",
    ),
    (
        FieldSlot::Budget,
        &["montant", "montant_estime", "valeur", "budget", "amount"],
        "montant",
    ),
    (
        FieldSlot::Procedure,
        &["procedure", "type_procedure", "mode_de_passation", "procedure_type"],
        "procedure",
    ),
    (
        FieldSlot::MarketType,
        &["type_marche", "type_du_marche", "type"],
        "type_marche",
    ),
    (
        FieldSlot::Place,
        &[
            "lieu_execution",
            "lieu_execution_nom",
            "lieu_dexecution",
            "localisation",
            "ville",
            "commune",
        ],
        "lieu_execution",
    ),
];

impl FieldSlot {
    fn entry(self) -> (&'static [&'static str], &'static str) {
        FIELD_CANDIDATES
            .iter()
            .find(|(slot, _, _)| *slot == self)
            .map(|(_, candidates, default)| (*candidates, *default))
            .unwrap_or((&[], ""))
    }

    /// 有序候选列名
    pub fn candidates(self) -> &'static [&'static str] {
        self.entry().0
    }

    /// 无候选命中时使用的列名
    pub fn default_column(self) -> &'static str {
        self.entry().1
    }

    /// 在数据集结构中选出该槽位的列名
    pub fn pick(self, schema: &DatasetSchema) -> String {
        self.candidates()
            .iter()
            .find(|candidate| schema.contains(candidate))
            .copied()
            .unwrap_or_else(|| self.default_column())
            .to_string()
    }
}

/// 已解析的列名
///
/// 每个槽位总是非空字符串；列在远端缺失时只体现为结果中的空值。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFields {
    pub date: String,
    pub title: String,
    pub url: String,
    pub cpv: String,
    pub dept: String,
    pub buyer: String,
    pub description: String,
    pub reference: String,
    pub service_category: String,
    pub nature: String,
    pub deadline: String,
    pub buyer_address: String,
    pub budget: String,
    pub procedure: String,
    pub market_type: String,
    pub place: String,
}

impl ResolvedFields {
    /// 根据数据集结构解析全部槽位，永不失败
    pub fn resolve(schema: &DatasetSchema) -> Self {
        Self {
            date: FieldSlot::Date.pick(schema),
            title: FieldSlot::Title.pick(schema),
            url: FieldSlot::Url.pick(schema),
            cpv: FieldSlot::Cpv.pick(schema),
            dept: FieldSlot::Dept.pick(schema),
            buyer: FieldSlot::Buyer.pick(schema),
            description: FieldSlot::Description.pick(schema),
            reference: FieldSlot::Reference.pick(schema),
            service_category: FieldSlot::ServiceCategory.pick(schema),
            nature: FieldSlot::Nature.pick(schema),
            deadline: FieldSlot::Deadline.pick(schema),
            buyer_address: FieldSlot::BuyerAddress.pick(schema),
            budget: FieldSlot::Budget.pick(schema),
            procedure: FieldSlot::Procedure.pick(schema),
            market_type: FieldSlot::MarketType.pick(schema),
            place: FieldSlot::Place.pick(schema),
        }
    }

    pub fn get(&self, slot: FieldSlot) -> &str {
        match slot {
            FieldSlot::Date => &self.date,
            FieldSlot::Title => &self.title,
            FieldSlot::Url => &self.url,
            FieldSlot::Cpv => &self.cpv,
            FieldSlot::Dept => &self.dept,
            FieldSlot::Buyer => &self.buyer,
            FieldSlot::Description => &self.description,
            FieldSlot::Reference => &self.reference,
            FieldSlot::ServiceCategory => &self.service_category,
            FieldSlot::Nature => &self.nature,
            FieldSlot::Deadline => &self.deadline,
            FieldSlot::BuyerAddress => &self.buyer_address,
            FieldSlot::Budget => &self.budget,
            FieldSlot::Procedure => &self.procedure,
            FieldSlot::MarketType => &self.market_type,
            FieldSlot::Place => &self.place,
        }
    }
}

impl Default for ResolvedFields {
    fn default() -> Self {
        Self::resolve(&DatasetSchema::default())
    }
}
