use std::collections::{BTreeMap, HashMap, HashSet};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// L2 归一化后的稀疏词向量（按词排序，保证求和顺序确定）
pub type TermVector = BTreeMap<String, f64>;

/// 文本归一化：去重音、转小写、非字母数字一律视为分隔符
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect()
}

/// 分词：单字符词（如 "d'Or" 中的 "d"）不计入
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .filter(|t| t.chars().nth(1).is_some())
        .map(str::to_string)
        .collect()
}

/// 与 1.0 相差在此范围内的余弦按 1.0 计（浮点求和误差）
const UNIT_EPSILON: f64 = 1e-9;

/// 预处理后的文本：词序列 + 整体向量
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedText {
    pub tokens: Vec<String>,
    pub vector: TermVector,
}

/// 名称相似度模型
///
/// 每次运行用本批次全部商户名和交易描述拟合一次 TF-IDF 权重，
/// 之后只读，可在多个打分线程间共享。
#[derive(Debug, Clone)]
pub struct NameSimilarity {
    idf: HashMap<String, f64>,
    documents: usize,
}

impl NameSimilarity {
    /// 平滑 IDF：`ln((1 + n) / (1 + df)) + 1`
    pub fn fit<I, S>(documents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut df: HashMap<String, usize> = HashMap::new();
        let mut n = 0usize;
        for doc in documents {
            n += 1;
            let unique: HashSet<String> = tokenize(doc.as_ref()).into_iter().collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let idf = df
            .into_iter()
            .map(|(term, count)| (term, smoothed_idf(n, count)))
            .collect();

        Self { idf, documents: n }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    pub fn document_count(&self) -> usize {
        self.documents
    }

    /// 未出现在语料中的词按 df = 0 计
    pub fn idf(&self, term: &str) -> f64 {
        self.idf
            .get(term)
            .copied()
            .unwrap_or_else(|| smoothed_idf(self.documents, 0))
    }

    pub fn vectorize(&self, tokens: &[String]) -> TermVector {
        let mut vector = TermVector::new();
        for token in tokens {
            *vector.entry(token.clone()).or_insert(0.0) += 1.0;
        }
        for (term, weight) in vector.iter_mut() {
            *weight *= self.idf(term);
        }

        let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in vector.values_mut() {
                *weight /= norm;
            }
        }
        vector
    }

    pub fn prepare(&self, text: &str) -> PreparedText {
        let tokens = tokenize(text);
        let vector = self.vectorize(&tokens);
        PreparedText { tokens, vector }
    }

    /// 商户名与交易描述的相似度
    ///
    /// 取 (a) 与整条描述的余弦、(b) 与描述中每个等长连续词窗口的余弦 中的最大值，
    /// 描述里多出的城市、卡号等词不会拉低分数。
    pub fn score(&self, vendor: &PreparedText, description: &PreparedText) -> f64 {
        if vendor.tokens.is_empty() || description.tokens.is_empty() {
            return 0.0;
        }

        let mut best = cosine(&vendor.vector, &description.vector);
        let width = vendor.tokens.len();
        if description.tokens.len() > width {
            for window in description.tokens.windows(width) {
                if best >= 1.0 - UNIT_EPSILON {
                    break;
                }
                let v = self.vectorize(window);
                best = best.max(cosine(&vendor.vector, &v));
            }
        }
        if best >= 1.0 - UNIT_EPSILON {
            return 1.0;
        }
        best.clamp(0.0, 1.0)
    }

    pub fn similarity(&self, vendor: &str, description: &str) -> f64 {
        self.score(&self.prepare(vendor), &self.prepare(description))
    }
}

fn smoothed_idf(documents: usize, df: usize) -> f64 {
    ((1.0 + documents as f64) / (1.0 + df as f64)).ln() + 1.0
}

/// 两个已归一化向量的余弦 = 点积
fn cosine(a: &TermVector, b: &TermVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|x| w * x))
        .sum()
}
