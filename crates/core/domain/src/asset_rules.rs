//! 资产推断规则表
//!
//! 根据传感器描述中的子串推断公司、地区和设备类型。
//! 这是尽力而为的启发式结果，不是权威数据：规则按顺序匹配，首个命中生效。

use crate::asset::SensorDescriptor;

/// 公司规则：描述包含 `needle` 时归属 `company`。
/// `location` 为 `None` 时改由地区规则表推断。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRule {
    pub needle: String,
    pub company: String,
    pub location: Option<String>,
}

impl CompanyRule {
    pub fn new(needle: &str, company: &str, location: Option<&str>) -> Self {
        Self {
            needle: needle.to_string(),
            company: company.to_string(),
            location: location.map(str::to_string),
        }
    }
}

/// 规则表的推断结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetClassification {
    pub company: String,
    pub location: String,
    pub equipment: String,
    pub products: Vec<String>,
}

impl AssetClassification {
    /// 资产 ID：`<公司>_<地区>`。
    pub fn asset_id(&self) -> String {
        format!("{}_{}", self.company, self.location)
    }

    /// 展示名：`<公司> - <地区>`。
    pub fn asset_name(&self) -> String {
        format!("{} - {}", self.company, self.location)
    }
}

/// 有序规则表。
#[derive(Debug, Clone)]
pub struct AssetRuleTable {
    pub companies: Vec<CompanyRule>,
    pub locations: Vec<(String, String)>,
    pub equipment: Vec<(String, String)>,
    pub default_equipment: String,
    pub products: Vec<(String, Vec<String>)>,
}

impl AssetRuleTable {
    /// 按描述推断资产信息；没有公司规则命中时返回 `None`。
    pub fn classify(&self, sensor: &SensorDescriptor) -> Option<AssetClassification> {
        let description = sensor.description.as_str();
        let rule = self
            .companies
            .iter()
            .find(|rule| description.contains(rule.needle.as_str()))?;
        let location = match &rule.location {
            Some(location) => location.clone(),
            None => first_match(&self.locations, description).unwrap_or_default(),
        };
        let equipment = first_match(&self.equipment, description)
            .unwrap_or_else(|| self.default_equipment.clone());
        Some(AssetClassification {
            company: rule.company.clone(),
            location,
            equipment,
            products: self.products_for(&rule.company),
        })
    }

    pub fn products_for(&self, company: &str) -> Vec<String> {
        self.products
            .iter()
            .find(|(name, _)| name == company)
            .map(|(_, products)| products.clone())
            .unwrap_or_default()
    }
}

fn first_match(rules: &[(String, String)], description: &str) -> Option<String> {
    rules
        .iter()
        .find(|(needle, _)| description.contains(needle.as_str()))
        .map(|(_, result)| result.clone())
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(needle, result)| (needle.to_string(), result.to_string()))
        .collect()
}

fn products(company: &str, items: &[&str]) -> (String, Vec<String>) {
    (
        company.to_string(),
        items.iter().map(|item| item.to_string()).collect(),
    )
}

impl Default for AssetRuleTable {
    /// 现有部署使用的石化企业规则。
    fn default() -> Self {
        Self {
            companies: vec![
                CompanyRule::new("СИБУР", "СИБУР Холдинг", None),
                CompanyRule::new("Нижнекамскнефтехим", "Нижнекамскнефтехим", Some("Татарстан")),
                CompanyRule::new(
                    "Ангарская НХК",
                    "Ангарская НХК (Роснефть)",
                    Some("Восточная Сибирь"),
                ),
                CompanyRule::new("ЗапСибНефтехим", "ЗапСибНефтехим", Some("Тюменская обл.")),
                CompanyRule::new(
                    "Новокуйбышевская НХК",
                    "Новокуйбышевская НХК",
                    Some("Самарская обл."),
                ),
                CompanyRule::new("Ставролен", "Ставролен", Some("Ставропольский край")),
                CompanyRule::new(
                    "Балтийский ХК",
                    "Балтийский Химический Комплекс",
                    Some("Ленинградская обл."),
                ),
                CompanyRule::new("Стерлитамакский НХЗ", "Стерлитамакский НХЗ", Some("Башкортостан")),
                CompanyRule::new("Кемеровский КХЗ", "Кемеровский КХЗ", Some("Кемеровская обл.")),
            ],
            locations: pairs(&[("Тобольск", "Тюменская обл.")]),
            equipment: pairs(&[
                ("Реактор", "Реактор"),
                ("Колонна", "Колонна"),
                ("Линия", "Производственная линия"),
                ("Резервуар", "Резервуар"),
                ("Силос", "Силос"),
                ("Батарея", "Коксовая батарея"),
            ]),
            default_equipment: "Оборудование".to_string(),
            products: vec![
                products("СИБУР Холдинг", &["Полипропилен", "Полиэтилен", "МТБЭ", "Бутадиен"]),
                products("Нижнекамскнефтехим", &["Синтетические каучуки", "Полиэтилен", "Стирол"]),
                products("Ангарская НХК (Роснефть)", &["Нефтепродукты", "Полимеры", "Ароматика"]),
                products("ЗапСибНефтехим", &["Полипропилен", "Полиэтилен"]),
                products("Новокуйбышевская НХК", &["Полипропилен", "Бутиловые каучуки", "МТБЭ"]),
                products("Ставролен", &["Полипропилен", "Полиэтилен"]),
                products("Балтийский Химический Комплекс", &["ПЭВД", "Полистирол"]),
                products("Стерлитамакский НХЗ", &["Каучуки", "Антиоксиданты", "МТБЭ"]),
                products("Кемеровский КХЗ", &["Кокс", "Бензол", "Нафталин"]),
            ],
        }
    }
}
