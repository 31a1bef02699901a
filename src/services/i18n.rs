//! Display-language string tables.
//!
//! Lookups never fail: a key missing from the selected language falls back to
//! English, and a key missing from English is returned as-is.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "EN", alias = "en")]
    En,
    #[serde(rename = "ID", alias = "id")]
    Id,
    #[serde(rename = "JP", alias = "jp")]
    Jp,
    #[serde(rename = "KR", alias = "kr")]
    Kr,
    #[serde(rename = "CN", alias = "cn")]
    Cn,
}

impl Language {
    pub const ALL: [Language; 5] = [Language::En, Language::Id, Language::Jp, Language::Kr, Language::Cn];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "EN",
            Language::Id => "ID",
            Language::Jp => "JP",
            Language::Kr => "KR",
            Language::Cn => "CN",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unsupported language: {}", s))
    }
}

/// Request-scoped display settings handed to every formatting and rendering call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub language: Language,
    pub dark_mode: bool,
}

type Table = HashMap<&'static str, &'static str>;

const EN: &[(&str, &str)] = &[
    ("title", "Survey Analysis Dashboard"),
    ("rows", "Rows"),
    ("cols", "Columns"),
    ("num_cols", "Numeric columns"),
    ("cat_cols", "Categorical columns"),
    ("text_cols", "Text columns"),
    ("hist_title", "Histogram"),
    ("box_title", "Boxplot"),
    ("scatter_title", "Scatter plot"),
    ("corr_matrix_title", "Pearson correlation matrix"),
    ("normal_interpret", "The data is likely consistent with a normal distribution (fail to reject H0)."),
    ("not_normal_interpret", "The data is unlikely to follow a normal distribution (reject H0)."),
    ("strength_very_weak", "Very weak"),
    ("strength_weak", "Weak"),
    ("strength_moderate", "Moderate"),
    ("strength_strong", "Strong"),
    ("strength_very_strong", "Very strong"),
    ("direction_positive", "Positive"),
    ("direction_negative", "Negative"),
    ("direction_none", "None"),
    ("pdf_filename", "survey_report_en.pdf"),
    ("pdf_generated_on", "Generated on %Y-%m-%d %H:%M:%S"),
    ("pdf_dataset_metadata", "Dataset metadata"),
    ("pdf_numeric_stats", "Numeric column statistics"),
    ("pdf_scatter_plots", "Scatter plots for numeric pairs"),
    ("pdf_cat_cols", "Categorical columns (top 10 categories)"),
    ("pdf_text_summary", "Text analysis summary (top 10 words per column)"),
    ("pdf_column", "Column"),
    ("pdf_text_column", "Text column"),
    ("pdf_normaltest_stat_label", "Normality statistic"),
    ("pdf_p_value_label", "p-value"),
    ("pdf_count", "Count"),
    ("pdf_mean", "Mean"),
    ("pdf_median", "Median"),
    ("pdf_mode", "Mode"),
    ("pdf_min", "Min"),
    ("pdf_max", "Max"),
    ("pdf_std", "Std. deviation"),
    ("pdf_normaltest_not_enough", "Normality test: not enough data (n < 8)."),
    ("invalid_file_type", "This file type is not supported, please upload a CSV, XLS, or XLSX file."),
    ("no_numeric", "No numeric columns were detected in this dataset."),
    ("no_valid_data", "There are no valid values in the selected column."),
    ("select_two_diff_columns", "Please select two different columns."),
    ("not_enough_data", "There is not enough data to run this analysis."),
    ("unknown_column", "The selected column does not exist in this dataset."),
];

const ID: &[(&str, &str)] = &[
    ("title", "Dasbor Analisis Survei"),
    ("rows", "Jumlah baris"),
    ("cols", "Jumlah kolom"),
    ("num_cols", "Kolom numerik"),
    ("cat_cols", "Kolom kategorikal"),
    ("text_cols", "Kolom teks"),
    ("corr_matrix_title", "Matriks korelasi Pearson"),
    ("normal_interpret", "Data kemungkinan mengikuti distribusi normal (gagal menolak H0)."),
    ("not_normal_interpret", "Data kemungkinan tidak berdistribusi normal (menolak H0)."),
    ("strength_very_weak", "Sangat lemah"),
    ("strength_weak", "Lemah"),
    ("strength_moderate", "Sedang"),
    ("strength_strong", "Kuat"),
    ("strength_very_strong", "Sangat kuat"),
    ("direction_positive", "Positif"),
    ("direction_negative", "Negatif"),
    ("direction_none", "Tidak ada"),
    ("pdf_filename", "laporan_survei_id.pdf"),
    ("pdf_generated_on", "Dihasilkan pada %Y-%m-%d %H:%M:%S"),
    ("pdf_dataset_metadata", "Metadata dataset"),
    ("pdf_numeric_stats", "Statistik kolom numerik"),
    ("pdf_scatter_plots", "Scatter plot untuk pasangan numerik"),
    ("pdf_cat_cols", "Kolom kategorikal (10 kategori teratas)"),
    ("pdf_text_summary", "Ringkasan analisis teks (10 kata teratas per kolom)"),
    ("pdf_column", "Kolom"),
    ("pdf_text_column", "Kolom teks"),
    ("pdf_normaltest_stat_label", "Statistik normalitas"),
    ("pdf_count", "Jumlah"),
    ("pdf_mean", "Rata-rata"),
    ("pdf_mode", "Modus"),
    ("pdf_max", "Maks"),
    ("pdf_std", "Simpangan baku"),
    ("pdf_normaltest_not_enough", "Uji normalitas: data belum cukup (n < 8)."),
    ("invalid_file_type", "Tipe file tidak didukung, unggah file CSV, XLS, atau XLSX."),
    ("no_numeric", "Tidak ada kolom numerik yang terdeteksi pada dataset ini."),
    ("no_valid_data", "Tidak ada nilai valid pada kolom yang dipilih."),
    ("select_two_diff_columns", "Pilih dua kolom yang berbeda."),
    ("not_enough_data", "Data belum cukup untuk menjalankan analisis ini."),
];

const JP: &[(&str, &str)] = &[
    ("title", "アンケート分析ダッシュボード"),
    ("rows", "行数"),
    ("cols", "列数"),
    ("num_cols", "数値列"),
    ("cat_cols", "カテゴリ列"),
    ("text_cols", "テキスト列"),
    ("hist_title", "ヒストグラム"),
    ("box_title", "箱ひげ図"),
    ("scatter_title", "散布図"),
    ("corr_matrix_title", "ピアソン相関行列"),
    ("normal_interpret", "データは正規分布とみなせる可能性があります（帰無仮説を棄却しません）。"),
    ("not_normal_interpret", "データは正規分布から外れている可能性があります（帰無仮説を棄却します）。"),
    ("strength_very_weak", "とても弱い"),
    ("strength_weak", "弱い"),
    ("strength_moderate", "中程度"),
    ("strength_strong", "強い"),
    ("strength_very_strong", "非常に強い"),
    ("direction_positive", "正の相関"),
    ("direction_negative", "負の相関"),
    ("direction_none", "相関なし"),
    ("pdf_filename", "survey_report_jp.pdf"),
    ("pdf_generated_on", "%Y-%m-%d %H:%M:%S に生成"),
    ("pdf_dataset_metadata", "データセットのメタデータ"),
    ("pdf_numeric_stats", "数値列の統計量"),
    ("pdf_scatter_plots", "数値ペアの散布図"),
    ("pdf_cat_cols", "カテゴリ列（上位 10 カテゴリ）"),
    ("pdf_text_summary", "テキスト分析サマリー（各列の上位 10 単語）"),
    ("pdf_column", "列"),
    ("pdf_text_column", "テキスト列"),
    ("pdf_normaltest_stat_label", "正規性統計量"),
    ("pdf_p_value_label", "p 値"),
    ("pdf_count", "件数"),
    ("pdf_mean", "平均"),
    ("pdf_median", "中央値"),
    ("pdf_mode", "最頻値"),
    ("pdf_min", "最小値"),
    ("pdf_max", "最大値"),
    ("pdf_std", "標準偏差"),
    ("pdf_normaltest_not_enough", "正規性検定：データが不足しています（n < 8）。"),
    ("invalid_file_type", "このファイル形式はサポートされていません。CSV・XLS・XLSX をアップロードしてください。"),
    ("no_valid_data", "選択した列には有効な値がありません。"),
    ("select_two_diff_columns", "異なる 2 つの列を選択してください。"),
    ("not_enough_data", "この分析を行うにはデータが不足しています。"),
];

const KR: &[(&str, &str)] = &[
    ("title", "설문 분석 대시보드"),
    ("rows", "행 수"),
    ("cols", "열 수"),
    ("num_cols", "수치형 열"),
    ("cat_cols", "범주형 열"),
    ("text_cols", "텍스트 열"),
    ("hist_title", "히스토그램"),
    ("box_title", "박스플롯"),
    ("scatter_title", "산점도"),
    ("corr_matrix_title", "피어슨 상관 행렬"),
    ("normal_interpret", "데이터가 정규 분포와 일치할 가능성이 높습니다 (귀무가설 기각 실패)."),
    ("not_normal_interpret", "데이터가 정규 분포에서 벗어날 가능성이 큽니다 (귀무가설 기각)."),
    ("strength_very_weak", "매우 약함"),
    ("strength_weak", "약함"),
    ("strength_moderate", "보통"),
    ("strength_strong", "강함"),
    ("strength_very_strong", "매우 강함"),
    ("direction_positive", "양의 상관"),
    ("direction_negative", "음의 상관"),
    ("direction_none", "상관 없음"),
    ("pdf_filename", "survey_report_kr.pdf"),
    ("pdf_generated_on", "%Y-%m-%d %H:%M:%S 에 생성됨"),
    ("pdf_dataset_metadata", "데이터셋 메타데이터"),
    ("pdf_numeric_stats", "수치형 열 통계"),
    ("pdf_scatter_plots", "수치형 쌍에 대한 산점도"),
    ("pdf_cat_cols", "범주형 열 (상위 10개 범주)"),
    ("pdf_text_summary", "텍스트 분석 요약 (열별 상위 10개 단어)"),
    ("pdf_column", "열"),
    ("pdf_text_column", "텍스트 열"),
    ("pdf_normaltest_stat_label", "정규성 통계량"),
    ("pdf_p_value_label", "p 값"),
    ("pdf_count", "개수"),
    ("pdf_mean", "평균"),
    ("pdf_median", "중앙값"),
    ("pdf_mode", "최빈값"),
    ("pdf_min", "최솟값"),
    ("pdf_max", "최댓값"),
    ("pdf_std", "표준편차"),
    ("pdf_normaltest_not_enough", "정규성 검정: 데이터가 부족합니다 (n < 8)."),
    ("invalid_file_type", "지원되지 않는 파일 형식입니다. CSV, XLS 또는 XLSX 파일을 업로드해 주세요."),
    ("no_valid_data", "선택한 열에 유효한 값이 없습니다."),
    ("select_two_diff_columns", "서로 다른 두 개의 열을 선택해 주세요."),
    ("not_enough_data", "이 분석을 수행하기에 데이터가 부족합니다."),
];

const CN: &[(&str, &str)] = &[
    ("title", "问卷分析仪表盘"),
    ("num_cols", "数值列"),
    ("cat_cols", "类别列"),
    ("text_cols", "文本列"),
    ("hist_title", "直方图"),
    ("box_title", "箱线图"),
    ("scatter_title", "散点图"),
    ("corr_matrix_title", "皮尔逊相关矩阵"),
    ("normal_interpret", "数据大致符合正态分布（无法拒绝原假设 H0）。"),
    ("not_normal_interpret", "数据可能不符合正态分布（拒绝原假设 H0）。"),
    ("strength_very_weak", "非常弱"),
    ("strength_weak", "较弱"),
    ("strength_moderate", "中等"),
    ("strength_strong", "较强"),
    ("strength_very_strong", "非常强"),
    ("direction_positive", "正相关"),
    ("direction_negative", "负相关"),
    ("direction_none", "无明显相关"),
    ("pdf_filename", "survey_report_cn.pdf"),
    ("pdf_generated_on", "生成时间：%Y-%m-%d %H:%M:%S"),
    ("pdf_dataset_metadata", "数据集元信息"),
    ("pdf_numeric_stats", "数值列统计信息"),
    ("pdf_scatter_plots", "数值对的散点图"),
    ("pdf_cat_cols", "类别列（前 10 个类别）"),
    ("pdf_text_summary", "文本分析摘要（每列前 10 个高频词）"),
    ("pdf_text_column", "文本列"),
    ("pdf_normaltest_stat_label", "正态性统计量"),
    ("pdf_p_value_label", "p 值"),
    ("pdf_count", "频数"),
    ("pdf_mean", "平均值"),
    ("pdf_median", "中位数"),
    ("pdf_mode", "众数"),
    ("pdf_min", "最小值"),
    ("pdf_max", "最大值"),
    ("pdf_std", "标准差"),
    ("pdf_normaltest_not_enough", "正态性检验：样本数量不足（n < 8）。"),
    ("invalid_file_type", "不支持的文件类型，请上传 CSV、XLS 或 XLSX 文件。"),
    ("no_valid_data", "所选列中没有有效的数值。"),
    ("select_two_diff_columns", "请选择两个不同的列。"),
    ("not_enough_data", "数据不足以执行此分析。"),
];

static TABLES: Lazy<HashMap<Language, Table>> = Lazy::new(|| {
    [
        (Language::En, EN),
        (Language::Id, ID),
        (Language::Jp, JP),
        (Language::Kr, KR),
        (Language::Cn, CN),
    ]
    .into_iter()
    .map(|(lang, entries)| (lang, entries.iter().copied().collect()))
    .collect()
});

/// Looks up `key` for `lang`, falling back to English and then to the key itself.
pub fn localize<'a>(lang: Language, key: &'a str) -> &'a str {
    let found = [lang, Language::En]
        .iter()
        .find_map(|l| TABLES.get(l).and_then(|table| table.get(key)).copied());
    match found {
        Some(text) => text,
        None => key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_language_wins() {
        assert_eq!(localize(Language::Id, "pdf_mode"), "Modus");
        assert_eq!(localize(Language::Jp, "pdf_filename"), "survey_report_jp.pdf");
    }

    #[test]
    fn missing_key_falls_back_to_english() {
        // not translated in the Indonesian table
        assert_eq!(localize(Language::Id, "pdf_median"), "Median");
        assert_eq!(localize(Language::Cn, "rows"), "Rows");
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        assert_eq!(localize(Language::Kr, "no_such_key"), "no_such_key");
    }

    #[test]
    fn language_codes_parse_case_insensitively() {
        assert_eq!("kr".parse::<Language>().unwrap(), Language::Kr);
        assert_eq!(" CN ".parse::<Language>().unwrap(), Language::Cn);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn every_language_has_a_report_filename() {
        for lang in Language::ALL {
            assert!(localize(lang, "pdf_filename").ends_with(".pdf"));
        }
    }
}
