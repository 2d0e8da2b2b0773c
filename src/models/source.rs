use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Text,
    File,
    Link,
}

/// A user-curated knowledge document. Only active sources are fed to the
/// answer-generation prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeSource {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub is_active: bool,
}

impl KnowledgeSource {
    pub fn new(title: &str, content: &str, kind: SourceKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            kind,
            is_active: true,
        }
    }
}

/// Seed source shipped with the app: the general conditions of a vehicle
/// body insurance policy.
pub fn default_sources() -> Vec<KnowledgeSource> {
    vec![KnowledgeSource::new(
        "شرایط عمومی بیمه بدنه",
        "ماده ۱- تعاریف:\n\
         ۱- بیمه گر: شرکت بیمه که مشخصات آن در بیمه نامه درج شده است و در ازای دریافت حق بیمه، جبران خسارت احتمالی را طبق شرایط بیمه نامه بر عهده می گیرد.\n\
         ۲- بیمه گذار: شخص حقیقی یا حقوقی است که مالک موضوع بیمه است یا به یکی از عناوین قانونی، نمایندگی مالک یا ذینفع را داشته یا مسئولیت حفظ موضوع بیمه را از طرف مالک داشته باشد و قرارداد بیمه را با بیمه گر منعقد می کند و متعهد پرداخت حق بیمه می باشد.\n\
         ۳- ذینفع: شخصی است که بنا به درخواست بیمه گذار نام وی در بیمه نامه درج گردیده است و تمام یا بخشی از خسارت به وی پرداخت می شود.\n\
         ۴- موضوع بیمه: وسیله نقلیه زمینی است که مشخصات آن در بیمه نامه درج شده است.\n\
         \n\
         ماده ۲- خطرات اصلی تحت پوشش:\n\
         ۱- حادثه: خسارتی که ناشی از برخورد موضوع بیمه به یک جسم ثابت یا متحرک و یا برخورد اجسام دیگر به موضوع بیمه و یا واژگونی و سقوط موضوع بیمه باشد.\n\
         ۲- آتش سوزی، صاعقه، انفجار: خسارتی که در اثر آتش سوزی، صاعقه و یا انفجار به موضوع بیمه و یا لوازم یدکی اصلی همراه آن وارد گردد.\n\
         ۳- سرقت کلی: در صورتی که موضوع بیمه دزدیده شود و یا در اثر عمل دزدی یا شروع به دزدی به وسیله نقلیه خسارت وارد شود.",
        SourceKind::Text,
    )]
}
